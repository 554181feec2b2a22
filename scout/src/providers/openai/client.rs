//! `OpenAI` API client implementation.
//!
//! Provides a client for OpenAI's Chat Completions API and compatible APIs.

use super::completion::CompletionModel;
use crate::providers::ApiClient;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::sync::Arc;
use std::time::Duration;

/// Default `OpenAI` API base URL.
pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1";

/// `OpenAI` API client for creating completion models.
///
/// # Example
///
/// ```rust,ignore
/// use scout::providers::openai::OpenAIClient;
///
/// let client = OpenAIClient::builder()
///     .api_key("sk-...")
///     .base_url("https://my-openai-proxy.com/v1")
///     .build()?;
/// ```
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: reqwest::Client,
    api_key: Arc<str>,
    base_url: Arc<str>,
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl OpenAIClient {
    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> OpenAIClientBuilder {
        OpenAIClientBuilder::default()
    }

    /// Create a completion model with the specified model ID.
    #[must_use]
    pub fn completion_model(&self, model_id: impl Into<String>) -> CompletionModel {
        CompletionModel::new(self.clone(), model_id)
    }
}

impl ApiClient for OpenAIClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(2);

        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, value);
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

/// Builder for [`OpenAIClient`].
#[derive(Debug, Default)]
pub struct OpenAIClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl OpenAIClientBuilder {
    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set a custom base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout in seconds. Default is no timeout.
    #[must_use]
    pub const fn timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the API key is missing
    /// and [`Error::Http`](crate::Error::Http) if the HTTP client fails to build.
    pub fn build(self) -> crate::Result<OpenAIClient> {
        let api_key = self
            .api_key
            .ok_or_else(|| crate::Error::config("OpenAI API key is required"))?;
        let base_url = self
            .base_url
            .map(|url| url.trim_end_matches('/').to_owned())
            .unwrap_or_else(|| OPENAI_API_BASE_URL.to_owned());

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(OpenAIClient {
            http_client: builder.build()?,
            api_key: api_key.into(),
            base_url: base_url.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = OpenAIClient::builder()
            .api_key("test-key")
            .base_url("https://custom.api.com/v1/")
            .timeout_secs(30)
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "https://custom.api.com/v1");
    }

    #[test]
    fn test_default_base_url() {
        let client = OpenAIClient::builder().api_key("test-key").build().unwrap();
        assert_eq!(client.base_url(), OPENAI_API_BASE_URL);
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = OpenAIClient::builder().build().unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = OpenAIClient::builder().api_key("sk-secret").build().unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_auth_headers() {
        let client = OpenAIClient::builder().api_key("sk-1").build().unwrap();
        let headers = client.auth_headers();
        assert_eq!(headers[AUTHORIZATION], "Bearer sk-1");
    }
}
