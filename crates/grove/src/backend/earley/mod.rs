mod chart;
mod config;
mod parser;

pub use config::EarleyConfig;

use crate::backend::{Algorithm, BackendCapabilities, ParseResult, ProgressMonitor, Recognizer};
use crate::error::GrammarError;
use crate::grammar::{Grammar, Nonterminal, PreparedGrammar, Token};
use std::fmt;
use std::sync::Arc;

/// Earley parser backend for chart-based parsing.
///
/// The Earley parser can handle any context-free grammar, including
/// ambiguous, cyclic and left-recursive grammars. It keeps one item set per
/// input position and builds the parse forest while completing items.
///
/// # Example
///
/// ```
/// use grove::backend::earley::{EarleyConfig, EarleyParser};
/// use grove::backend::Recognizer;
/// use grove::grammar::Grammar;
///
/// let mut grammar = Grammar::<char>::new();
/// let e = grammar.nonterminal("E");
/// let plus = grammar.token('+');
/// let one = grammar.token('1');
/// grammar.add_rule(e, [e.into(), plus, e.into()])?;
/// grammar.add_rule(e, [one])?;
///
/// let mut parser = EarleyParser::new(&grammar, e, EarleyConfig::default())?;
/// let input: Vec<char> = "1+1+1".chars().collect();
/// let result = parser.parse(&input);
/// assert!(result.succeeded());
/// assert_eq!(result.forest().map(|forest| forest.total_parses()), Some(2));
/// # Ok::<(), grove::GrammarError>(())
/// ```
pub struct EarleyParser<T: Token> {
    grammar: Arc<PreparedGrammar<T>>,
    config: EarleyConfig,
    monitor: Option<Box<dyn ProgressMonitor>>,
}

impl<T: Token> EarleyParser<T> {
    /// Create a parser over an already prepared grammar.
    #[must_use]
    pub fn from_prepared(grammar: Arc<PreparedGrammar<T>>, config: EarleyConfig) -> Self {
        Self {
            grammar,
            config,
            monitor: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EarleyConfig {
        &self.config
    }
}

impl<T: Token> fmt::Debug for EarleyParser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EarleyParser")
            .field("start", &self.grammar.grammar().nonterminal_name(self.grammar.start()))
            .field("config", &self.config)
            .field("monitor", &self.monitor.is_some())
            .finish()
    }
}

impl<T: Token> Recognizer<T> for EarleyParser<T> {
    type Config = EarleyConfig;

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
            name: "Earley",
            algorithm: Algorithm::Earley,
            supports_left_recursion: true,
            supports_ambiguity: true,
            supports_cycles: true,
            supports_prefix_parsing: true,
        }
    }
}
