//! Configuration for history compaction.

use serde::{Deserialize, Serialize};

/// Default token budget for a request's message list.
pub const DEFAULT_MAX_TOKENS: usize = 100_000;

/// Default number of most recent messages kept verbatim.
pub const DEFAULT_KEEP_RECENT: usize = 10;

/// Controls when and how history compaction occurs.
///
/// # Example
///
/// ```
/// use scout::context::CompactionConfig;
///
/// let config = CompactionConfig::default()
///     .with_max_tokens(50_000)
///     .with_keep_recent(6);
/// assert_eq!(config.keep_recent, 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionConfig {
    /// Compaction runs when a message list counts more tokens than this.
    pub max_tokens: usize,
    /// Number of most recent messages that are never summarized.
    pub keep_recent: usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            keep_recent: DEFAULT_KEEP_RECENT,
        }
    }
}

impl CompactionConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token budget.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the number of recent messages to keep verbatim.
    #[must_use]
    pub const fn with_keep_recent(mut self, keep_recent: usize) -> Self {
        self.keep_recent = keep_recent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_builders() {
        let config = CompactionConfig::new();
        assert_eq!(config.max_tokens, 100_000);
        assert_eq!(config.keep_recent, 10);

        let tuned = config.with_max_tokens(10).with_keep_recent(2);
        assert_eq!((tuned.max_tokens, tuned.keep_recent), (10, 2));
    }
}
