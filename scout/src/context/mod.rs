//! Conversation context management.
//!
//! - [`TokenCounter`] estimates the token size of a message list.
//! - [`HistoryCompactor`] shrinks lists over budget by summarizing older turns.

mod compactor;
mod config;
mod counter;
#[cfg(test)]
mod strategies;

pub use compactor::{CompactionOutcome, CompactionResult, HistoryCompactor, SUMMARY_PREFIX};
pub use config::{CompactionConfig, DEFAULT_KEEP_RECENT, DEFAULT_MAX_TOKENS};
pub use counter::{REPLY_PRIMING_TOKENS, TOKENS_PER_MESSAGE, TokenCounter, TokenizerKind};
