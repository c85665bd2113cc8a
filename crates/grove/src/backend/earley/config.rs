//! Configuration for Earley parser

/// Configuration options for the Earley parser
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EarleyConfig {
    /// Record the longest accepted prefix and surface it when the full parse fails
    pub prefix_parsing: bool,

    /// Keep the item sets and return them in the result
    pub retain_chart: bool,

    /// Skip predicting rules whose FIRST set rejects the next atom
    pub lookahead: bool,
}

impl Default for EarleyConfig {
    fn default() -> Self {
        Self {
            prefix_parsing: false,
            retain_chart: false,
            lookahead: true,
        }
    }
}

impl EarleyConfig {
    /// Create a new configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable prefix parsing
    #[must_use]
    pub fn with_prefix_parsing(mut self, enabled: bool) -> Self {
        self.prefix_parsing = enabled;
        self
    }

    /// Enable or disable chart retention
    #[must_use]
    pub fn with_retained_chart(mut self, enabled: bool) -> Self {
        self.retain_chart = enabled;
        self
    }

    /// Enable or disable lookahead filtering of predictions
    #[must_use]
    pub fn with_lookahead(mut self, enabled: bool) -> Self {
        self.lookahead = enabled;
        self
    }
}
