//! LLM provider implementations.
//!
//! Every provider implements the [`Model`] trait, which is the only seam the
//! [`Runner`](crate::agent::Runner) and the
//! [`HistoryCompactor`](crate::context::HistoryCompactor) talk to.
//!
//! # Supported Providers
//!
//! - **`OpenAI`**: the Chat Completions API and compatible endpoints
//! - **Mock**: a scripted model for tests
//!
//! # Example
//!
//! ```rust,ignore
//! use scout::providers::OpenAIClient;
//!
//! let client = OpenAIClient::builder().api_key("sk-...").build()?;
//! let model = client.completion_model("gpt-5-mini-2025-08-07");
//! ```

mod config;
mod types;

pub mod mock;
pub mod openai;

pub use config::RetryConfig;
pub use mock::MockModel;
pub use openai::OpenAIClient;
pub use types::{GenerateOptions, ModelResponse, TokenUsage, ToolChoice};

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::error::LlmError;
use crate::message::Message;

/// The core trait for language model implementations.
///
/// # Implementing a Custom Provider
///
/// 1. Implement [`model_id`](Model::model_id)
/// 2. Implement [`generate`](Model::generate)
/// 3. Optionally override [`provider`](Model::provider)
#[async_trait]
pub trait Model: Send + Sync {
    /// Get the model identifier (e.g., "gpt-4o").
    fn model_id(&self) -> &str;

    /// Generate a response for the given messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the response cannot be parsed.
    async fn generate(
        &self,
        messages: Vec<Message>,
        options: GenerateOptions,
    ) -> Result<ModelResponse, LlmError>;

    /// Get the provider name (e.g., "openai").
    fn provider(&self) -> &'static str {
        "unknown"
    }
}

/// Base configuration for HTTP API clients.
pub trait ApiClient: Clone + Send + Sync {
    /// Get the base URL for API requests.
    fn base_url(&self) -> &str;

    /// Get the HTTP client instance.
    fn http_client(&self) -> &reqwest::Client;

    /// Build authentication headers for API requests.
    fn auth_headers(&self) -> HeaderMap;
}

/// Safely convert u64 to u32, saturating at `u32::MAX` if overflow.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn saturating_u32(value: u64) -> u32 {
    if value > u32::MAX as u64 {
        u32::MAX
    } else {
        value as u32
    }
}
