//! The [`Agent`] context object and its builder.

use std::fmt;
use std::sync::Arc;

use crate::config::{DEFAULT_MAX_ROUNDS, DEFAULT_SYSTEM_PROMPT, Settings};
use crate::context::{CompactionConfig, HistoryCompactor, TokenCounter};
use crate::error::Result;
use crate::message::Message;
use crate::providers::{Model, OpenAIClient, RetryConfig};
use crate::tool::ToolInvoker;

use super::result::TurnResult;
use super::runner::Runner;

/// Behavioral knobs for an [`Agent`].
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Leading system prompt; omitted from the conversation when empty.
    pub system_prompt: String,
    /// Maximum tool rounds per turn before a final answer is forced.
    pub max_rounds: usize,
    /// Retry policy for model calls.
    pub retry: RetryConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            retry: RetryConfig::default(),
        }
    }
}

/// Everything a conversation turn needs: model, token budget, compactor and
/// tools.
///
/// Built once at startup and shared; [`Agent::chat`] and [`Agent::run`] take
/// `&self`, so independent turns may run concurrently.
#[derive(Clone)]
pub struct Agent {
    pub(crate) model: Arc<dyn Model>,
    pub(crate) compactor: HistoryCompactor,
    pub(crate) tools: ToolInvoker,
    pub(crate) config: AgentConfig,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("model", &self.model.model_id())
            .field("compactor", &self.compactor)
            .field("tools", &self.tools)
            .field("config", &self.config)
            .finish()
    }
}

impl Agent {
    /// Start building an agent around `model`.
    pub fn builder(model: Arc<dyn Model>) -> AgentBuilder {
        AgentBuilder::new(model)
    }

    /// Build the full object graph from [`Settings`]: `OpenAI` client and
    /// model, tokenizer, compactor and Brave-backed tools.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the client or the
    /// tokenizer cannot be constructed.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = OpenAIClient::builder()
            .api_key(settings.openai_api_key.clone())
            .base_url(settings.openai_base_url.clone())
            .build()?;
        let model: Arc<dyn Model> = Arc::new(client.completion_model(settings.model.clone()));

        Self::builder(model)
            .system_prompt(settings.system_prompt.clone())
            .compaction(
                CompactionConfig::new()
                    .with_max_tokens(settings.max_tokens)
                    .with_keep_recent(settings.keep_recent),
            )
            .max_rounds(settings.max_rounds)
            .tools(ToolInvoker::from_brave_key(settings.brave_api_key.clone()))
            .build()
    }

    /// Answer `message` given the prior `history`, returning only the final
    /// assistant text.
    ///
    /// # Errors
    ///
    /// Propagates model failures that survive the retry policy.
    pub async fn chat(&self, message: &str, history: Vec<Message>) -> Result<Option<String>> {
        Ok(self.run(message, history).await?.output)
    }

    /// Run one full turn and return everything it produced.
    ///
    /// # Errors
    ///
    /// Propagates model failures that survive the retry policy.
    pub async fn run(&self, message: &str, history: Vec<Message>) -> Result<TurnResult> {
        Runner::run(self, message, history).await
    }

    /// The chat model.
    #[must_use]
    pub fn model(&self) -> &dyn Model {
        self.model.as_ref()
    }

    /// The history compactor.
    #[must_use]
    pub const fn compactor(&self) -> &HistoryCompactor {
        &self.compactor
    }

    /// The tool invoker.
    #[must_use]
    pub const fn tools(&self) -> &ToolInvoker {
        &self.tools
    }

    /// The agent configuration.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for [`Agent`].
pub struct AgentBuilder {
    model: Arc<dyn Model>,
    counter: Option<TokenCounter>,
    compaction: CompactionConfig,
    tools: Option<ToolInvoker>,
    config: AgentConfig,
}

impl fmt::Debug for AgentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentBuilder")
            .field("model", &self.model.model_id())
            .field("compaction", &self.compaction)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AgentBuilder {
    fn new(model: Arc<dyn Model>) -> Self {
        Self {
            model,
            counter: None,
            compaction: CompactionConfig::default(),
            tools: None,
            config: AgentConfig::default(),
        }
    }

    /// Use a specific token counter instead of the model's tokenizer.
    #[must_use]
    pub fn counter(mut self, counter: TokenCounter) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Set the compaction budget.
    #[must_use]
    pub const fn compaction(mut self, config: CompactionConfig) -> Self {
        self.compaction = config;
        self
    }

    /// Set the tool invoker (defaults to search disabled plus the web fetcher).
    #[must_use]
    pub fn tools(mut self, tools: ToolInvoker) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set the leading system prompt.
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    /// Set the tool round cap.
    #[must_use]
    pub const fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.config.max_rounds = max_rounds;
        self
    }

    /// Set the model retry policy.
    #[must_use]
    pub const fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Finish building.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if no counter was given
    /// and no tokenizer could be loaded.
    pub fn build(self) -> Result<Agent> {
        let counter = match self.counter {
            Some(counter) => counter,
            None => TokenCounter::for_model(self.model.model_id())?,
        };
        let compactor = HistoryCompactor::new(Arc::clone(&self.model), counter, self.compaction);
        let tools = self
            .tools
            .unwrap_or_else(|| ToolInvoker::from_brave_key(None));

        Ok(Agent {
            model: self.model,
            compactor,
            tools,
            config: self.config,
        })
    }
}
