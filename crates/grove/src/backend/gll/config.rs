//! Configuration for GLL parser

/// Configuration options for the GLL parser
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct GllConfig {
    /// Surface the longest accepted prefix when the full parse fails
    pub prefix_parsing: bool,

    /// Only start rules whose FIRST set accepts the next atom
    pub lookahead: bool,

    /// Also require FOLLOW to accept the next atom before starting a
    /// nullable rule. Ignored while prefix parsing.
    pub follow_check: bool,
}

impl Default for GllConfig {
    fn default() -> Self {
        Self {
            prefix_parsing: false,
            lookahead: true,
            follow_check: true,
        }
    }
}

impl GllConfig {
    /// Create a new configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_prefix_parsing(mut self, enabled: bool) -> Self {
        self.prefix_parsing = enabled;
        self
    }

    #[must_use]
    pub fn with_lookahead(mut self, enabled: bool) -> Self {
        self.lookahead = enabled;
        self
    }

    #[must_use]
    pub fn with_follow_check(mut self, enabled: bool) -> Self {
        self.follow_check = enabled;
        self
    }
}
