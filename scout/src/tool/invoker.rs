//! Dispatch of model tool calls to their handlers.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{ToolDefinition, ToolInvocation, ToolName, ToolOutcome};
use crate::error::{Error, Result, ToolError};
use crate::message::ToolCall;
use crate::tools::{PageFetcher, WebPageFetcher, WebSearch};

/// Maps a tool name and JSON arguments to a handler and reports the outcome.
///
/// Construction checks that the advertised definitions and the handled tools
/// agree, so a model can never be offered a tool that has no handler.
#[derive(Debug, Clone)]
pub struct ToolInvoker {
    search: Arc<WebSearch>,
    fetcher: Arc<dyn PageFetcher>,
    definitions: Vec<ToolDefinition>,
}

impl ToolInvoker {
    /// Create an invoker advertising [`ToolName::definitions`].
    pub fn new(search: WebSearch, fetcher: impl PageFetcher + 'static) -> Self {
        Self {
            search: Arc::new(search),
            fetcher: Arc::new(fetcher),
            definitions: ToolName::definitions(),
        }
    }

    /// Create an invoker with a Brave key (or none) and the default page fetcher.
    #[must_use]
    pub fn from_brave_key(api_key: Option<String>) -> Self {
        Self::new(WebSearch::brave(api_key), WebPageFetcher::new())
    }

    /// Replace the advertised definitions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a definition names an unknown tool, a
    /// tool is defined twice, or a registered tool has no definition.
    pub fn with_definitions(mut self, definitions: Vec<ToolDefinition>) -> Result<Self> {
        validate_definitions(&definitions)?;
        self.definitions = definitions;
        Ok(self)
    }

    /// The tool definitions advertised to the model.
    #[must_use]
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Execute a model-issued tool call.
    pub async fn invoke_call(&self, call: &ToolCall) -> ToolOutcome {
        self.invoke(call.name(), call.arguments()).await
    }

    /// Execute `function_name` with its JSON `arguments`.
    ///
    /// Never fails: unknown tools, malformed arguments and handler failures
    /// are all reported as [`ToolOutcome::ErrorPayload`].
    pub async fn invoke(&self, function_name: &str, arguments: &str) -> ToolOutcome {
        let invocation = match ToolInvocation::parse(function_name, arguments) {
            Ok(invocation) => invocation,
            Err(ToolError::NotFound(name)) => {
                warn!(tool = %name, "Model requested an unknown tool");
                return ToolOutcome::error("Unknown function");
            }
            Err(e) => {
                warn!(tool = function_name, error = %e, "Rejected tool arguments");
                return ToolOutcome::error(e.to_string());
            }
        };

        debug!(tool = %invocation.name(), "Executing tool");
        let outcome = self.dispatch(invocation).await;
        debug!(
            tool = function_name,
            error = outcome.is_error(),
            "Tool finished"
        );
        outcome
    }

    async fn dispatch(&self, invocation: ToolInvocation) -> ToolOutcome {
        match invocation {
            ToolInvocation::SearchWeb { query } => {
                let results = self.search.search(&query).await;
                if results.is_empty() {
                    return ToolOutcome::DegradedEmpty;
                }
                match serde_json::to_value(results) {
                    Ok(value) => ToolOutcome::Success(value),
                    Err(e) => ToolOutcome::error(e.to_string()),
                }
            }
            ToolInvocation::GetUrlRawContent { url } => match self.fetcher.fetch(&url).await {
                Ok(text) => ToolOutcome::Success(serde_json::Value::String(text)),
                Err(e) => {
                    warn!(url = %url, error = %e, "Page fetch failed");
                    ToolOutcome::error(e.to_string())
                }
            },
        }
    }
}

fn validate_definitions(definitions: &[ToolDefinition]) -> Result<()> {
    let mut seen = Vec::with_capacity(definitions.len());
    for def in definitions {
        let name: ToolName = def
            .name
            .parse()
            .map_err(|_| Error::config(format!("no handler for advertised tool '{}'", def.name)))?;
        if seen.contains(&name) {
            return Err(Error::config(format!("tool '{name}' is defined twice")));
        }
        seen.push(name);
    }
    if let Some(missing) = ToolName::ALL.iter().find(|name| !seen.contains(name)) {
        return Err(Error::config(format!("tool '{missing}' has no definition")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct StubFetcher {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<String, ToolError> {
            self.seen.lock().unwrap().push(url.to_owned());
            if url.is_empty() {
                Err(ToolError::invalid_args("URL must start with http:// or https://"))
            } else {
                Ok(format!("contents of {url}"))
            }
        }
    }

    fn invoker() -> ToolInvoker {
        ToolInvoker::new(WebSearch::disabled(), StubFetcher::default())
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let outcome = invoker().invoke("delete_everything", "{}").await;
        assert_eq!(outcome, ToolOutcome::error("Unknown function"));
        assert_eq!(outcome.to_content(), r#"{"error":"Unknown function"}"#);
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let outcome = invoker().invoke("search_web", "{oops").await;
        let ToolOutcome::ErrorPayload(message) = outcome else {
            panic!("expected error payload");
        };
        assert!(message.starts_with("Invalid arguments:"));
    }

    #[tokio::test]
    async fn test_search_without_key_degrades() {
        let outcome = invoker()
            .invoke("search_web", r#"{"query":"weather in Paris"}"#)
            .await;
        assert_eq!(outcome, ToolOutcome::DegradedEmpty);
        assert_eq!(outcome.to_content(), "[]");
    }

    #[tokio::test]
    async fn test_page_fetch_success_and_failure() {
        let invoker = invoker();

        let call = ToolCall::new("c1", "get_url_raw_content", r#"{"url":"https://a.example"}"#);
        let outcome = invoker.invoke_call(&call).await;
        assert_eq!(
            outcome,
            ToolOutcome::Success(json!("contents of https://a.example"))
        );

        let missing = invoker.invoke("get_url_raw_content", "{}").await;
        assert!(missing.is_error());
        let content: serde_json::Value = serde_json::from_str(&missing.to_content()).unwrap();
        assert!(content["error"].as_str().unwrap().contains("http://"));
    }

    #[test]
    fn test_definitions_must_match_handlers() {
        let ok = invoker().with_definitions(ToolName::definitions());
        assert!(ok.is_ok());

        let only_search = vec![ToolName::SearchWeb.definition()];
        assert!(matches!(
            invoker().with_definitions(only_search),
            Err(Error::Config(_))
        ));

        let mut extra = ToolName::definitions();
        extra.push(ToolDefinition {
            name: "run_shell".into(),
            description: "nope".into(),
            parameters: json!({"type": "object", "properties": {}}),
            required: Vec::new(),
        });
        assert!(matches!(
            invoker().with_definitions(extra),
            Err(Error::Config(_))
        ));

        let mut dup = ToolName::definitions();
        dup.push(ToolName::SearchWeb.definition());
        assert!(invoker().with_definitions(dup).is_err());
    }
}
