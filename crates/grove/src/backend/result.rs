use crate::backend::{Algorithm, Recognizer};
use crate::error::UsageError;
use crate::forest::ParseForest;
use crate::grammar::{StateId, Token};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseMetrics {
    pub tokens_consumed: usize,
    pub nodes_created: usize,
    /// Earley items or GLL descriptors processed.
    pub work_items: usize,
    pub parse_time: Duration,
}

/// Items of one retained Earley chart position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPosition {
    /// Absolute input position.
    pub position: usize,
    /// `(state, absolute origin)` pairs in insertion order.
    pub items: Vec<(StateId, usize)>,
}

/// Outcome of one recognizer run.
///
/// A run that does not accept its input is still a result: the forest is
/// absent (or rooted at the last accepted prefix), and the token count,
/// last token and more-input flag describe where recognition stopped.
#[derive(Debug)]
pub struct ParseResult<T: Token> {
    pub(crate) algorithm: Algorithm,
    pub(crate) success: bool,
    pub(crate) forest: Option<ParseForest<T>>,
    pub(crate) offset: usize,
    pub(crate) token_count: usize,
    pub(crate) last_token: Option<T>,
    pub(crate) more_input: bool,
    pub(crate) prefix_end: Option<usize>,
    pub(crate) metrics: ParseMetrics,
    pub(crate) chart: Option<Vec<ChartPosition>>,
}

impl<T: Token> ParseResult<T> {
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Whether the whole input was accepted.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.success
    }

    /// The forest of a successful parse, or of the accepted prefix.
    #[must_use]
    pub fn forest(&self) -> Option<&ParseForest<T>> {
        self.forest.as_ref()
    }

    #[must_use]
    pub fn into_forest(self) -> Option<ParseForest<T>> {
        self.forest
    }

    /// Position in the complete input where this run started.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Tokens read by this run, including the one it failed on.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// The last token read, which is the offending one on failure.
    #[must_use]
    pub fn last_token(&self) -> Option<&T> {
        self.last_token.as_ref()
    }

    /// Whether input remained unread when recognition stopped.
    #[must_use]
    pub fn more_input(&self) -> bool {
        self.more_input
    }

    /// Whether the parse failed but a prefix of the input was accepted.
    #[must_use]
    pub fn prefix_succeeded(&self) -> bool {
        !self.success && self.prefix_end.is_some()
    }

    /// Absolute end of the accepted prefix, where a continuation starts.
    #[must_use]
    pub fn prefix_end(&self) -> Option<usize> {
        self.prefix_end
    }

    #[must_use]
    pub fn metrics(&self) -> &ParseMetrics {
        &self.metrics
    }

    /// The retained chart, when the recognizer was configured to keep it.
    #[must_use]
    pub fn chart(&self) -> Option<&[ChartPosition]> {
        self.chart.as_deref()
    }

    /// Run `recognizer` again on `input`, starting after the accepted prefix.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::NoPrefix`] unless this result is a prefix success.
    pub fn continue_parsing<R>(&self, recognizer: &mut R, input: &[T]) -> Result<ParseResult<T>, UsageError>
    where
        R: Recognizer<T>,
    {
        match self.prefix_end {
            Some(end) if !self.success => Ok(recognizer.parse_from(input, end)),
            _ => Err(UsageError::NoPrefix),
        }
    }
}
