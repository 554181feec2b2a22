//! Turn results.

use crate::message::Message;
use crate::providers::TokenUsage;

/// Everything one conversation turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    /// The assistant's final text, if it produced any.
    pub output: Option<String>,
    /// The full conversation at the end of the turn, starting with the
    /// system prompt when one is configured.
    pub messages: Vec<Message>,
    /// Number of chat model calls made.
    pub rounds: usize,
    /// Number of tool calls executed.
    pub tool_calls: usize,
    /// Number of compaction passes that rewrote the conversation.
    pub compactions: usize,
    /// Token usage reported by the provider, summed over all calls.
    pub usage: TokenUsage,
    pub(crate) has_system_prompt: bool,
}

impl TurnResult {
    /// The conversation without the leading system prompt, suitable as
    /// `history` for the next turn.
    #[must_use]
    pub fn into_history(self) -> Vec<Message> {
        let mut messages = self.messages;
        if self.has_system_prompt && messages.first().is_some_and(Message::is_system) {
            messages.remove(0);
        }
        messages
    }

    /// Borrowing variant of [`TurnResult::into_history`].
    #[must_use]
    pub fn history(&self) -> &[Message] {
        let skip = usize::from(
            self.has_system_prompt && self.messages.first().is_some_and(Message::is_system),
        );
        &self.messages[skip..]
    }
}
