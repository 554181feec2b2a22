//! Chat Completions model for the `OpenAI` provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::client::OpenAIClient;
use crate::error::LlmError;
use crate::message::Message;
use crate::providers::{
    ApiClient, GenerateOptions, Model, ModelResponse, TokenUsage, ToolChoice, saturating_u32,
};

const PROVIDER: &str = "openai";

/// A Chat Completions model bound to an [`OpenAIClient`].
#[derive(Debug, Clone)]
pub struct CompletionModel {
    client: OpenAIClient,
    model_id: String,
}

impl CompletionModel {
    /// Create a new completion model.
    pub fn new(client: OpenAIClient, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [Message],
        options: &GenerateOptions,
    ) -> ChatCompletionRequest<'a> {
        let tools = options
            .tools
            .as_ref()
            .filter(|t| !t.is_empty())
            .map(|defs| defs.iter().map(|d| d.to_openai_tool()).collect());
        let tool_choice = tools.as_ref().and(options.tool_choice);

        ChatCompletionRequest {
            model: &self.model_id,
            messages,
            tools,
            tool_choice,
        }
    }

    /// Map a non-success HTTP response to an [`LlmError`].
    fn status_error(status: u16, body: &str) -> LlmError {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_owned());

        match status {
            401 | 403 => LlmError::auth(PROVIDER, message),
            429 => LlmError::rate_limited(PROVIDER),
            400 | 404 | 422 => LlmError::invalid_request(message).with_provider(PROVIDER),
            _ => LlmError::http_status(status, message).with_provider(PROVIDER),
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[async_trait]
impl Model for CompletionModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(
        &self,
        messages: Vec<Message>,
        options: GenerateOptions,
    ) -> Result<ModelResponse, LlmError> {
        let request = self.build_request(&messages, &options);
        let url = format!("{}/chat/completions", self.client.base_url());

        debug!(
            model = %self.model_id,
            messages = messages.len(),
            tools = options.has_tools(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .http_client()
            .post(&url)
            .headers(self.client.auth_headers())
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::from(e).with_provider(PROVIDER))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::from(e).with_provider(PROVIDER))?;

        if !status.is_success() {
            return Err(Self::status_error(status.as_u16(), &body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::response_format("chat completion JSON", e.to_string())
                .with_provider(PROVIDER)
        })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            LlmError::response_format("at least one choice", "none").with_provider(PROVIDER)
        })?;

        let mut result = ModelResponse::new(choice.message);
        if let Some(usage) = parsed.usage {
            result = result.with_token_usage(TokenUsage::new(
                saturating_u32(usage.prompt_tokens),
                saturating_u32(usage.completion_tokens),
            ));
        }
        Ok(result)
    }

    fn provider(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmErrorKind;
    use crate::tool::ToolName;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model_for(server: &MockServer) -> CompletionModel {
        OpenAIClient::builder()
            .api_key("sk-test")
            .base_url(server.uri())
            .build()
            .unwrap()
            .completion_model("gpt-4o-mini")
    }

    #[test]
    fn test_request_omits_tool_choice_without_tools() {
        let client = OpenAIClient::builder().api_key("k").build().unwrap();
        let model = client.completion_model("gpt-4o");
        let messages = vec![Message::user("hi")];
        let options = GenerateOptions::new().with_tool_choice(ToolChoice::None);
        let value = serde_json::to_value(model.build_request(&messages, &options)).unwrap();
        assert_eq!(
            value,
            json!({"model": "gpt-4o", "messages": [{"role": "user", "content": "hi"}]})
        );
    }

    #[test]
    fn test_status_error_mapping() {
        let body = r#"{"error": {"message": "Incorrect API key provided"}}"#;
        let err = CompletionModel::status_error(401, body);
        assert_eq!(err.kind, LlmErrorKind::Auth);
        assert_eq!(err.message, "Incorrect API key provided");

        assert_eq!(
            CompletionModel::status_error(429, "").kind,
            LlmErrorKind::RateLimited
        );
        let server_err = CompletionModel::status_error(500, "boom");
        assert_eq!(server_err.kind, LlmErrorKind::HttpStatus);
        assert!(server_err.is_retryable());
    }

    #[tokio::test]
    async fn test_generate_parses_tool_calls_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "tool_choice": "auto",
                "tools": [{"type": "function", "function": {"name": "search_web"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": "search_web", "arguments": "{\"query\":\"rust\"}"}
                        }]
                    }
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = GenerateOptions::new()
            .with_tools(ToolName::definitions())
            .with_tool_choice(ToolChoice::Auto);
        let response = model_for(&server)
            .generate(vec![Message::user("search rust")], options)
            .await
            .unwrap();

        assert!(response.has_tool_calls());
        assert_eq!(response.tool_calls()[0].id, "call_1");
        assert_eq!(response.token_usage, Some(TokenUsage::new(12, 3)));
    }

    #[tokio::test]
    async fn test_generate_maps_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"error": {"message": "bad key"}})),
            )
            .mount(&server)
            .await;

        let err = model_for(&server)
            .generate(vec![Message::user("hi")], GenerateOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Auth);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = model_for(&server)
            .generate(vec![Message::user("hi")], GenerateOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::ResponseFormat);
    }
}
