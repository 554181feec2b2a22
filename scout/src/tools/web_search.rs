//! Web search backed by a pluggable [`SearchProvider`].
//!
//! ```text
//! WebSearch (search_web handler)
//!   └── Option<dyn SearchProvider>
//!         └── BraveProvider (requires API key)
//! ```
//!
//! [`WebSearch::search`] never fails. A missing provider (no API key), an
//! empty query and any provider error all degrade to an empty result list.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ToolError;

/// Upper bound on results returned by a single search.
pub const MAX_SEARCH_RESULTS: usize = 5;

/// Request timeout applied to search provider calls.
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default Brave Search API base URL.
pub const BRAVE_API_BASE_URL: &str = "https://api.search.brave.com";

/// A single web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Title of the result.
    pub title: String,
    /// URL of the result.
    pub url: String,
}

/// Pluggable search backend trait.
#[async_trait]
pub trait SearchProvider: Send + Sync + fmt::Debug {
    /// A human-readable name for this provider (used in tracing output).
    fn provider_name(&self) -> &str;

    /// Execute a search query and return up to `max_results` results.
    async fn search(&self, query: &str, max_results: usize)
    -> Result<Vec<SearchResult>, ToolError>;
}

/// A boxed search provider for dynamic dispatch.
pub type BoxedSearchProvider = Box<dyn SearchProvider>;

/// Search provider backed by the [Brave Search](https://brave.com/search/api/) API.
///
/// The API key is sent via the `X-Subscription-Token` header.
#[derive(Clone)]
pub struct BraveProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl fmt::Debug for BraveProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BraveProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl BraveProvider {
    /// Create a new Brave Search provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: BRAVE_API_BASE_URL.to_owned(),
            client: reqwest::Client::new(),
            timeout: SEARCH_TIMEOUT,
        }
    }

    /// Point the provider at a different API host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// Brave Search API response types (private).
#[derive(Deserialize)]
struct BraveResponse {
    web: Option<BraveWebResults>,
}

#[derive(Deserialize)]
struct BraveWebResults {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[async_trait]
#[allow(clippy::unnecessary_literal_bound)]
impl SearchProvider for BraveProvider {
    fn provider_name(&self) -> &str {
        "brave"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ToolError> {
        let count = max_results.to_string();
        let url = url::Url::parse_with_params(
            &format!("{}/res/v1/web/search", self.base_url),
            [("q", query), ("count", count.as_str())],
        )
        .map_err(|e| ToolError::execution(format!("Invalid Brave Search URL: {e}")))?;

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ToolError::execution(format!("Brave Search request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ToolError::execution(format!(
                "Brave Search error (HTTP {status}): {text}"
            )));
        }

        let parsed: BraveResponse = response.json().await.map_err(|e| {
            ToolError::execution(format!("Failed to parse Brave Search response: {e}"))
        })?;

        // Non-object items and items without a URL are skipped.
        Ok(parsed
            .web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| serde_json::from_value::<BraveResult>(item).ok())
            .filter_map(|r| {
                let url = r.url.filter(|u| !u.is_empty())?;
                Some(SearchResult {
                    title: r.title.unwrap_or_default(),
                    url,
                })
            })
            .take(max_results)
            .collect())
    }
}

/// The `search_web` handler.
pub struct WebSearch {
    provider: Option<BoxedSearchProvider>,
    max_results: usize,
}

impl fmt::Debug for WebSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSearch")
            .field(
                "provider",
                &self.provider.as_ref().map(|p| p.provider_name()),
            )
            .field("max_results", &self.max_results)
            .finish()
    }
}

impl WebSearch {
    /// Create a web search handler with the given provider.
    pub fn new(provider: impl SearchProvider + 'static) -> Self {
        Self {
            provider: Some(Box::new(provider)),
            max_results: MAX_SEARCH_RESULTS,
        }
    }

    /// A handler with no provider; every search returns no results.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            provider: None,
            max_results: MAX_SEARCH_RESULTS,
        }
    }

    /// Brave-backed search, or a disabled handler when no key is configured.
    #[must_use]
    pub fn brave(api_key: Option<String>) -> Self {
        match api_key.filter(|key| !key.trim().is_empty()) {
            Some(key) => Self::new(BraveProvider::new(key)),
            None => Self::disabled(),
        }
    }

    /// Set the maximum number of results, clamped to `1..=MAX_SEARCH_RESULTS`.
    #[must_use]
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max.clamp(1, MAX_SEARCH_RESULTS);
        self
    }

    /// Whether a provider is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Search for `query`, in provider relevance order.
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        let Some(provider) = &self.provider else {
            debug!("No search provider configured; returning no results");
            return Vec::new();
        };
        if query.trim().is_empty() {
            return Vec::new();
        }

        match provider.search(query, self.max_results).await {
            Ok(mut results) => {
                results.truncate(self.max_results);
                debug!(
                    provider = provider.provider_name(),
                    results = results.len(),
                    "Search completed"
                );
                results
            }
            Err(e) => {
                warn!(provider = provider.provider_name(), error = %e, "Search failed");
                Vec::new()
            }
        }
    }
}
