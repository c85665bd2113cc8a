//! # Recognizer Backends
//!
//! Two general context-free recognizers that build the same forest contract.
//!
//! ## Available Backends
//!
//! - **Earley** ([`earley::EarleyParser`]): chart parsing that builds forest
//!   nodes while completing items
//! - **GLL** ([`gll::GllParser`]): descriptor-driven parsing that records
//!   binary subtree relations and converts them to a forest afterwards
//!
//! Both accept any context-free grammar, including left-recursive, cyclic and
//! ambiguous ones, and both support prefix parsing.
//!
//! ## Usage
//!
//! Backends implement the [`Recognizer`] trait:
//!
//! ```
//! use grove::backend::earley::{EarleyConfig, EarleyParser};
//! use grove::backend::Recognizer;
//! use grove::grammar::Grammar;
//!
//! let mut grammar = Grammar::<char>::new();
//! let s = grammar.nonterminal("S");
//! let a = grammar.token('a');
//! grammar.add_rule(s, [a, a])?;
//!
//! let mut parser = EarleyParser::new(&grammar, s, EarleyConfig::default())?;
//! let result = parser.parse(&['a', 'a']);
//! assert!(result.succeeded());
//! assert_eq!(result.forest().map(|forest| forest.total_parses()), Some(1));
//! # Ok::<(), grove::GrammarError>(())
//! ```
//!
//! A failed parse is reported in the [`ParseResult`], never as an error.

pub mod earley;
pub mod gll;
mod progress;
mod result;

pub use progress::{LoggingMonitor, ProgressMonitor};
pub use result::{ChartPosition, ParseMetrics, ParseResult};

use crate::error::GrammarError;
use crate::grammar::{Grammar, Nonterminal, PreparedGrammar, Token};
use std::sync::Arc;

/// Main recognizer trait
pub trait Recognizer<T: Token>: Sized {
    type Config: Default + Clone;

    /// Create a recognizer for `grammar` starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if the start symbol is not defined.
    fn new(grammar: &Grammar<T>, start: Nonterminal, config: Self::Config)
        -> Result<Self, GrammarError>;

    /// Recognize the whole of `input`.
    fn parse(&mut self, input: &[T]) -> ParseResult<T> {
        self.parse_from(input, 0)
    }

    /// Recognize `input[offset..]`. Forest spans stay absolute.
    fn parse_from(&mut self, input: &[T], offset: usize) -> ParseResult<T>;

    /// The prepared grammar shared with the forests this recognizer builds.
    fn prepared(&self) -> &Arc<PreparedGrammar<T>>;

    /// Install a progress callback.
    fn set_progress_monitor(&mut self, monitor: Box<dyn ProgressMonitor>);

    /// Get backend capabilities
    fn capabilities() -> BackendCapabilities;
}

/// Capabilities of a recognizer backend
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct BackendCapabilities {
    pub name: &'static str,
    pub algorithm: Algorithm,
    pub supports_left_recursion: bool,
    pub supports_ambiguity: bool,
    pub supports_cycles: bool,
    pub supports_prefix_parsing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    Earley,
    Gll,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Earley => "Earley",
            Self::Gll => "GLL",
        })
    }
}
