//! Summarization-based history compaction.
//!
//! A message list is split into three segments:
//!
//! ```text
//! [leading system] | middle ............ | trailing (last keep_recent)
//!        kept      |  summarized by model |      kept verbatim
//! ```
//!
//! The middle segment is rendered as a transcript and replaced by a single
//! system message holding the model's summary. If summarization fails the
//! middle segment is dropped instead; compaction itself never fails.

use std::fmt::Write;
use std::sync::Arc;

use tracing::{info, warn};

use super::config::CompactionConfig;
use super::counter::TokenCounter;
use crate::error::LlmError;
use crate::message::{Message, Role};
use crate::providers::{GenerateOptions, Model};

/// Prefix of the system message that carries a conversation summary.
pub const SUMMARY_PREFIX: &str = "Summary of the earlier conversation:\n\n";

const SUMMARIZER_INSTRUCTIONS: &str = "You summarize conversations between a user and an AI \
assistant that can search the web. Write a concise summary that preserves key facts, \
findings from web searches and pages read, source URLs, the user's goals and preferences, \
and any open questions. Do not add information that is not in the conversation.";

/// What a compaction pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// Nothing to compact; the input is returned as is.
    Unchanged,
    /// The middle segment was replaced by a summary message.
    Summarized,
    /// Summarization failed; the middle segment was dropped.
    Truncated,
}

/// The result of a compaction pass.
#[derive(Debug, Clone)]
pub struct CompactionResult {
    /// The new message list.
    pub messages: Vec<Message>,
    /// What happened.
    pub outcome: CompactionOutcome,
    /// Number of messages before compaction.
    pub original_count: usize,
}

impl CompactionResult {
    const fn unchanged(messages: Vec<Message>, original_count: usize) -> Self {
        Self {
            messages,
            outcome: CompactionOutcome::Unchanged,
            original_count,
        }
    }

    /// Whether the message list was rewritten.
    #[must_use]
    pub fn is_compacted(&self) -> bool {
        self.outcome != CompactionOutcome::Unchanged
    }
}

/// Shrinks message lists that exceed the token budget.
#[derive(Clone)]
pub struct HistoryCompactor {
    model: Arc<dyn Model>,
    counter: TokenCounter,
    config: CompactionConfig,
}

impl std::fmt::Debug for HistoryCompactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryCompactor")
            .field("model", &self.model.model_id())
            .field("counter", &self.counter)
            .field("config", &self.config)
            .finish()
    }
}

impl HistoryCompactor {
    /// Create a compactor that summarizes with `model`.
    pub fn new(model: Arc<dyn Model>, counter: TokenCounter, config: CompactionConfig) -> Self {
        Self {
            model,
            counter,
            config,
        }
    }

    /// The compaction configuration.
    #[must_use]
    pub const fn config(&self) -> &CompactionConfig {
        &self.config
    }

    /// The token counter used for budget checks.
    #[must_use]
    pub const fn counter(&self) -> &TokenCounter {
        &self.counter
    }

    /// Whether `messages` exceed the token budget.
    #[must_use]
    pub fn needs_compaction(&self, messages: &[Message]) -> bool {
        self.counter.count_messages(messages) > self.config.max_tokens
    }

    /// Compact `messages` if they exceed the token budget.
    pub async fn compact_if_needed(&self, messages: Vec<Message>) -> CompactionResult {
        if self.needs_compaction(&messages) {
            self.compact(messages).await
        } else {
            let count = messages.len();
            CompactionResult::unchanged(messages, count)
        }
    }

    /// Compact `messages` unconditionally.
    pub async fn compact(&self, mut messages: Vec<Message>) -> CompactionResult {
        let original_count = messages.len();
        let keep_recent = self.config.keep_recent;
        if original_count <= keep_recent.saturating_add(1) {
            return CompactionResult::unchanged(messages, original_count);
        }

        let lead = usize::from(messages.first().is_some_and(Message::is_system));
        let mut trailing_start = original_count - keep_recent;

        // Never separate tool results from the assistant message that requested them.
        while trailing_start > lead
            && trailing_start < original_count
            && messages[trailing_start].role == Role::Tool
        {
            trailing_start -= 1;
        }

        if trailing_start <= lead {
            return CompactionResult::unchanged(messages, original_count);
        }

        let trailing = messages.split_off(trailing_start);
        let middle = messages.split_off(lead);
        let mut compacted = messages;

        let outcome = match self.summarize(&middle).await {
            Ok(summary) => {
                compacted.push(Message::system(format!("{SUMMARY_PREFIX}{summary}")));
                CompactionOutcome::Summarized
            }
            Err(reason) => {
                warn!(
                    dropped = middle.len(),
                    reason = %reason,
                    "Summarization failed; dropping earlier conversation"
                );
                CompactionOutcome::Truncated
            }
        };
        compacted.extend(trailing);

        if outcome == CompactionOutcome::Summarized {
            info!(
                before = original_count,
                after = compacted.len(),
                summarized = middle.len(),
                "Compacted conversation history"
            );
        }

        CompactionResult {
            messages: compacted,
            outcome,
            original_count,
        }
    }

    async fn summarize(&self, middle: &[Message]) -> Result<String, LlmError> {
        let transcript = render_transcript(middle);
        let request = vec![
            Message::system(SUMMARIZER_INSTRUCTIONS),
            Message::user(format!(
                "Summarize the following conversation:\n\n{transcript}"
            )),
        ];

        let response = self
            .model
            .generate(request, GenerateOptions::new())
            .await?;

        match response.text().map(str::trim) {
            Some(summary) if !summary.is_empty() => Ok(summary.to_owned()),
            _ => Err(LlmError::response_format("non-empty summary", "empty text")),
        }
    }
}

/// Render messages as `role: content` lines, skipping messages without text.
fn render_transcript(messages: &[Message]) -> String {
    let mut output = String::new();
    for message in messages {
        let Some(content) = message.text().filter(|c| !c.trim().is_empty()) else {
            continue;
        };
        let _ = writeln!(output, "{}: {content}", message.role);
    }
    output
}
