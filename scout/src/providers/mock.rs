//! Scripted model for tests and offline development.
//!
//! [`MockModel`] replays a queue of canned responses (or errors) in order and
//! records every request it receives, so tests can assert on exactly what the
//! driver and compactor sent to the model.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::LlmError;
use crate::message::{Message, ToolCall};
use crate::providers::{GenerateOptions, Model, ModelResponse, ToolChoice};

/// A request observed by a [`MockModel`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Messages sent to the model.
    pub messages: Vec<Message>,
    /// Names of the tools advertised with the request.
    pub tool_names: Vec<String>,
    /// Tool choice mode of the request.
    pub tool_choice: Option<ToolChoice>,
}

/// A model that returns scripted responses in FIFO order.
#[derive(Debug)]
pub struct MockModel {
    model_id: String,
    responses: Mutex<VecDeque<Result<ModelResponse, LlmError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModel {
    /// Create an empty mock model with the id `mock-model`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            model_id: "mock-model".to_owned(),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a full response.
    #[must_use]
    pub fn with_response(self, response: ModelResponse) -> Self {
        self.push(Ok(response));
        self
    }

    /// Queue a plain text assistant reply.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_response(ModelResponse::new(Message::assistant(text)))
    }

    /// Queue an assistant reply requesting tool calls.
    #[must_use]
    pub fn with_tool_calls(self, calls: Vec<ToolCall>) -> Self {
        self.with_response(ModelResponse::new(Message::assistant_with_tool_calls(
            None, calls,
        )))
    }

    /// Queue a failure.
    #[must_use]
    pub fn with_error(self, error: LlmError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, item: Result<ModelResponse, LlmError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(item);
    }

    /// All requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `generate` calls received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of scripted responses not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Model for MockModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(
        &self,
        messages: Vec<Message>,
        options: GenerateOptions,
    ) -> Result<ModelResponse, LlmError> {
        let tool_names = options
            .tools
            .iter()
            .flatten()
            .map(|d| d.name.clone())
            .collect();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                messages,
                tool_names,
                tool_choice: options.tool_choice,
            });

        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::provider("mock", "no scripted responses left")))
    }

    fn provider(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let model = MockModel::new()
            .with_text("first")
            .with_error(LlmError::network("down"));

        let first = model
            .generate(vec![Message::user("a")], GenerateOptions::new())
            .await
            .unwrap();
        assert_eq!(first.text(), Some("first"));

        let second = model
            .generate(vec![Message::user("b")], GenerateOptions::new())
            .await;
        assert!(second.is_err());

        let exhausted = model.generate(Vec::new(), GenerateOptions::new()).await;
        assert!(exhausted.is_err());

        assert_eq!(model.call_count(), 3);
        assert_eq!(model.requests()[1].messages[0].text(), Some("b"));
        assert_eq!(model.remaining(), 0);
    }

    #[test]
    fn test_identity() {
        let model = MockModel::new();
        assert_eq!(model.model_id(), "mock-model");
        assert_eq!(model.provider(), "mock");
    }
}
