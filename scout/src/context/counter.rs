//! BPE token counting for chat message lists.

use std::fmt;
use std::sync::Arc;

use tiktoken_rs::CoreBPE;
use tracing::debug;

use crate::error::{Error, Result};
use crate::message::Message;

/// Framing tokens added per message (role and separators).
pub const TOKENS_PER_MESSAGE: usize = 4;

/// Tokens reserved once per request for priming the assistant reply.
pub const REPLY_PRIMING_TOKENS: usize = 2;

/// How the tokenizer is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerKind {
    /// The tokenizer registered for a model id, falling back to
    /// [`TokenizerKind::Default`] when the id is unknown.
    ModelSpecific(String),
    /// The general-purpose `cl100k_base` encoding.
    Default,
}

/// Counts tokens for message lists with a resolved BPE tokenizer.
///
/// Cloning is cheap; the tokenizer is shared.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: Arc<CoreBPE>,
    encoding: String,
}

impl fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCounter")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl TokenCounter {
    /// Resolve a tokenizer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the default encoding cannot be loaded.
    pub fn new(kind: &TokenizerKind) -> Result<Self> {
        if let TokenizerKind::ModelSpecific(model) = kind {
            match tiktoken_rs::get_bpe_from_model(model) {
                Ok(bpe) => {
                    return Ok(Self {
                        bpe: Arc::new(bpe),
                        encoding: format!("model:{model}"),
                    });
                }
                Err(e) => {
                    debug!(model = %model, error = %e, "No tokenizer for model, using cl100k_base");
                }
            }
        }

        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| Error::config(format!("failed to load cl100k_base tokenizer: {e}")))?;
        Ok(Self {
            bpe: Arc::new(bpe),
            encoding: "cl100k_base".to_owned(),
        })
    }

    /// Tokenizer for `model`, with the default fallback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the default encoding cannot be loaded.
    pub fn for_model(model: &str) -> Result<Self> {
        Self::new(&TokenizerKind::ModelSpecific(model.to_owned()))
    }

    /// A short label for the resolved encoding.
    #[must_use]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Number of tokens in `text`.
    #[must_use]
    pub fn count_text(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_ordinary(text).len()
    }

    /// Tokens for one message, including framing.
    #[must_use]
    pub fn count_message(&self, message: &Message) -> usize {
        let mut total = TOKENS_PER_MESSAGE
            .saturating_add(self.count_text(message.role.as_str()))
            .saturating_add(message.content.as_deref().map_or(0, |c| self.count_text(c)))
            .saturating_add(
                message
                    .tool_call_id
                    .as_deref()
                    .map_or(0, |id| self.count_text(id)),
            );

        if let Some(calls) = &message.tool_calls {
            // Serializing plain strings cannot fail.
            let json = serde_json::to_string(calls).unwrap_or_default();
            total = total.saturating_add(self.count_text(&json));
        }
        total
    }

    /// Tokens for a whole request's message list.
    #[must_use]
    pub fn count_messages(&self, messages: &[Message]) -> usize {
        messages
            .iter()
            .map(|m| self.count_message(m))
            .fold(REPLY_PRIMING_TOKENS, usize::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use crate::context::strategies::{COUNTER, conversation, message};
    use crate::message::ToolCall;

    fn counter() -> TokenCounter {
        TokenCounter::new(&TokenizerKind::Default).unwrap()
    }

    #[test]
    fn test_empty_list_is_priming_only() {
        assert_eq!(counter().count_messages(&[]), REPLY_PRIMING_TOKENS);
    }

    #[test]
    fn test_message_overhead() {
        let counter = counter();
        let msg = Message::user("hello world");
        let expected =
            TOKENS_PER_MESSAGE + counter.count_text("user") + counter.count_text("hello world");
        assert_eq!(counter.count_message(&msg), expected);
        assert_eq!(counter.count_messages(&[msg]), expected + REPLY_PRIMING_TOKENS);
    }

    #[test]
    fn test_tool_fields_are_counted() {
        let counter = counter();
        let call = ToolCall::new("call_abc", "search_web", r#"{"query":"rust"}"#);
        let with_calls = Message::assistant_with_tool_calls(None, vec![call]);
        let bare = Message::assistant_with_tool_calls(None, Vec::new());
        assert!(counter.count_message(&with_calls) > counter.count_message(&bare));

        let tool = Message::tool("call_abc", "[]");
        let expected = TOKENS_PER_MESSAGE
            + counter.count_text("tool")
            + counter.count_text("[]")
            + counter.count_text("call_abc");
        assert_eq!(counter.count_message(&tool), expected);
    }

    #[test]
    fn test_appending_never_decreases_count() {
        let counter = counter();
        let mut messages = vec![Message::system("You are helpful.")];
        let mut last = counter.count_messages(&messages);
        for i in 0..5 {
            messages.push(Message::user(format!("question {i}")));
            messages.push(Message::assistant(""));
            let now = counter.count_messages(&messages);
            assert!(now > last);
            last = now;
        }
    }

    proptest! {
        #[test]
        fn appending_a_message_increases_the_count(
            messages in conversation(),
            extra in message(),
        ) {
            let before = COUNTER.count_messages(&messages);
            let mut longer = messages;
            longer.push(extra);
            prop_assert!(COUNTER.count_messages(&longer) > before);
        }
    }

    #[test]
    fn test_unknown_model_falls_back() {
        let counter = TokenCounter::for_model("definitely-not-a-model").unwrap();
        assert_eq!(counter.encoding(), "cl100k_base");
        assert!(counter.count_text("hello") > 0);

        let known = TokenCounter::for_model("gpt-4o").unwrap();
        assert_eq!(known.encoding(), "model:gpt-4o");
    }
}
