//! Process-wide settings, read once at startup.
//!
//! | Variable            | Field             | Default                    |
//! |---------------------|-------------------|----------------------------|
//! | `OPENAI_API_KEY`    | `openai_api_key`  | required                   |
//! | `OPENAI_BASE_URL`   | `openai_base_url` | `https://api.openai.com/v1`|
//! | `BRAVE_API_KEY`     | `brave_api_key`   | unset (search disabled)    |
//! | `SCOUT_MODEL`       | `model`           | `gpt-5-mini-2025-08-07`    |
//! | `SCOUT_MAX_TOKENS`  | `max_tokens`      | `100000`                   |
//! | `SCOUT_KEEP_RECENT` | `keep_recent`     | `10`                       |
//! | `SCOUT_MAX_ROUNDS`  | `max_rounds`      | `10`                       |

use std::fmt;
use std::str::FromStr;

use crate::context::{DEFAULT_KEEP_RECENT, DEFAULT_MAX_TOKENS};
use crate::error::{Error, Result};
use crate::providers::openai::OPENAI_API_BASE_URL;

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-5-mini-2025-08-07";

/// Default cap on tool rounds per user turn.
pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// The persona and instructions sent as the leading system message.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful AI assistant with access to real-time web search capabilities. You can:

1. Search the web using the search_web function to find current information, news, facts, and answers to questions
2. Extract and read content from specific URLs using the get_url_raw_content function to get detailed information from web pages

When answering questions:
- Use web search when you need current information, recent events, or facts you're not certain about
- After searching, you can retrieve full content from promising URLs to get detailed information
- Synthesize information from multiple sources when appropriate
- Always provide clear, accurate, and well-sourced answers
- Cite your sources when referencing web content

Be proactive in using your tools to provide the most accurate and up-to-date information possible.";

/// Runtime settings for an [`Agent`](crate::agent::Agent).
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// `OpenAI` API key.
    pub openai_api_key: String,
    /// `OpenAI`-compatible API base URL.
    pub openai_base_url: String,
    /// Brave Search key; search returns no results without one.
    pub brave_api_key: Option<String>,
    /// Chat model identifier.
    pub model: String,
    /// Token budget before history compaction.
    pub max_tokens: usize,
    /// Messages kept verbatim by compaction.
    pub keep_recent: usize,
    /// Maximum tool rounds per user turn.
    pub max_rounds: usize,
    /// Leading system prompt.
    pub system_prompt: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("openai_api_key", &"[REDACTED]")
            .field("openai_base_url", &self.openai_base_url)
            .field(
                "brave_api_key",
                &self.brave_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("keep_recent", &self.keep_recent)
            .field("max_rounds", &self.max_rounds)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Settings with defaults for everything except the API key.
    pub fn new(openai_api_key: impl Into<String>) -> Self {
        Self {
            openai_api_key: openai_api_key.into(),
            openai_base_url: OPENAI_API_BASE_URL.to_owned(),
            brave_api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
            keep_recent: DEFAULT_KEEP_RECENT,
            max_rounds: DEFAULT_MAX_ROUNDS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
        }
    }

    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `OPENAI_API_KEY` is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// See [`Settings::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| Error::config("OPENAI_API_KEY environment variable not set"))?;
        let mut settings = Self::new(api_key);

        if let Some(base_url) = get("OPENAI_BASE_URL") {
            settings.openai_base_url = base_url;
        }
        settings.brave_api_key = get("BRAVE_API_KEY");
        if let Some(model) = get("SCOUT_MODEL") {
            settings.model = model;
        }
        if let Some(value) = get("SCOUT_MAX_TOKENS") {
            settings.max_tokens = parse_var("SCOUT_MAX_TOKENS", &value)?;
        }
        if let Some(value) = get("SCOUT_KEEP_RECENT") {
            settings.keep_recent = parse_var("SCOUT_KEEP_RECENT", &value)?;
        }
        if let Some(value) = get("SCOUT_MAX_ROUNDS") {
            settings.max_rounds = parse_var("SCOUT_MAX_ROUNDS", &value)?;
        }

        Ok(settings)
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::config(format!("{name}={value:?} is invalid: {e}")))
}
