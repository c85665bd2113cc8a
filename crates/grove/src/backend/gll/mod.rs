mod bsr;
mod config;
mod crf;
mod parser;

pub use config::GllConfig;

use crate::backend::{Algorithm, BackendCapabilities, ParseResult, ProgressMonitor, Recognizer};
use crate::error::GrammarError;
use crate::grammar::{Grammar, Nonterminal, PreparedGrammar, Token};
use std::fmt;
use std::sync::Arc;

/// Generalized LL parser backend.
///
/// Handles every context-free grammar, left recursion and cycles included.
/// Recognition records binary subtree relations; on acceptance they are
/// expanded into a [`ParseForest`](crate::forest::ParseForest) with the
/// same shape the Earley backend produces, so the walker and the parse
/// counts do not depend on the backend.
///
/// GLL does not keep a chart, so [`ParseResult::chart`] is always `None`.
///
/// # Example
///
/// ```
/// use grove::backend::gll::{GllConfig, GllParser};
/// use grove::backend::Recognizer;
/// use grove::grammar::Grammar;
///
/// let mut grammar = Grammar::<char>::new();
/// let s = grammar.nonterminal("S");
/// let a = grammar.token('a');
/// grammar.add_rule(s, [s.into(), a])?;
/// grammar.add_rule(s, [a])?;
///
/// let mut parser = GllParser::new(&grammar, s, GllConfig::default())?;
/// assert!(parser.parse(&['a', 'a', 'a']).succeeded());
/// # Ok::<(), grove::GrammarError>(())
/// ```
pub struct GllParser<T: Token> {
    grammar: Arc<PreparedGrammar<T>>,
    config: GllConfig,
    monitor: Option<Box<dyn ProgressMonitor>>,
}

impl<T: Token> GllParser<T> {
    /// Create a parser over an already prepared grammar.
    #[must_use]
    pub fn from_prepared(grammar: Arc<PreparedGrammar<T>>, config: GllConfig) -> Self {
        Self {
            grammar,
            config,
            monitor: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GllConfig {
        &self.config
    }
}

impl<T: Token> fmt::Debug for GllParser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GllParser")
            .field("start", &self.grammar.grammar().nonterminal_name(self.grammar.start()))
            .field("config", &self.config)
            .field("monitor", &self.monitor.is_some())
            .finish()
    }
}

impl<T: Token> Recognizer<T> for GllParser<T> {
    type Config = GllConfig;

    fn new(grammar: &Grammar<T>, start: Nonterminal, config: Self::Config) -> Result<Self, GrammarError> {
        let prepared = PreparedGrammar::new(grammar, start)?;
        Ok(Self::from_prepared(Arc::new(prepared), config))
    }

    fn parse_from(&mut self, input: &[T], offset: usize) -> ParseResult<T> {
        parser::parse(
            &self.grammar,
            &self.config,
            input,
            offset,
            self.monitor.as_deref_mut(),
        )
    }

    fn prepared(&self) -> &Arc<PreparedGrammar<T>> {
        &self.grammar
    }

    fn set_progress_monitor(&mut self, monitor: Box<dyn ProgressMonitor>) {
        self.monitor = Some(monitor);
    }

    fn capabilities() -> BackendCapabilities {
        BackendCapabilities {
            name: "GLL",
            algorithm: Algorithm::Gll,
            supports_left_recursion: true,
            supports_ambiguity: true,
            supports_cycles: true,
            supports_prefix_parsing: true,
        }
    }
}
