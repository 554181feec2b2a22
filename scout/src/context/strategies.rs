//! Generated conversations for property tests.

use std::sync::LazyLock;

use proptest::prelude::*;

use super::counter::{TokenCounter, TokenizerKind};
use crate::message::{Message, ToolCall};

pub(crate) static COUNTER: LazyLock<TokenCounter> = LazyLock::new(|| {
    TokenCounter::new(&TokenizerKind::Default).expect("default tokenizer")
});

#[derive(Debug, Clone)]
enum Segment {
    User(String),
    Reply(String),
    /// An assistant message with `n` calls followed by their `n` results.
    ToolBatch(usize),
}

fn segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        "[a-z ]{0,40}".prop_map(Segment::User),
        "[a-z ]{0,40}".prop_map(Segment::Reply),
        (1usize..4).prop_map(Segment::ToolBatch),
    ]
}

/// A single message of any role.
pub(crate) fn message() -> impl Strategy<Value = Message> {
    prop_oneof![
        "[a-z ]{0,40}".prop_map(|text| Message::system(text)),
        "[a-z ]{0,40}".prop_map(|text| Message::user(text)),
        "[a-z ]{0,40}".prop_map(|text| Message::assistant(text)),
        ("[a-z0-9_]{1,12}", "[a-z ]{0,40}").prop_map(|(id, text)| Message::tool(id, text)),
        "[a-z ]{1,20}".prop_map(|query| {
            Message::assistant_with_tool_calls(
                None,
                vec![ToolCall::new(
                    "call_0",
                    "search_web",
                    serde_json::json!({ "query": query }).to_string(),
                )],
            )
        }),
    ]
}

/// A well-formed conversation: optional leading system prompt, then user
/// messages, replies and tool batches in any order.
pub(crate) fn conversation() -> impl Strategy<Value = Vec<Message>> {
    (any::<bool>(), prop::collection::vec(segment(), 0..16)).prop_map(|(system, segments)| {
        let mut messages = Vec::new();
        if system {
            messages.push(Message::system("You are helpful."));
        }
        for (i, segment) in segments.into_iter().enumerate() {
            match segment {
                Segment::User(text) => messages.push(Message::user(text)),
                Segment::Reply(text) => messages.push(Message::assistant(text)),
                Segment::ToolBatch(n) => {
                    let ids: Vec<String> = (0..n).map(|j| format!("call_{i}_{j}")).collect();
                    let calls = ids
                        .iter()
                        .map(|id| ToolCall::new(id.as_str(), "search_web", r#"{"query":"q"}"#))
                        .collect();
                    messages.push(Message::assistant_with_tool_calls(None, calls));
                    for id in ids {
                        messages.push(Message::tool(id, "[]"));
                    }
                }
            }
        }
        messages
    })
}
