//! Runner: the conversation driver.
//!
//! The [`Runner`] drives one user turn through an explicit state machine:
//!
//! ```text
//!            ┌──────────────────────────────┐
//!            ▼                              │
//!   AwaitingModel ──tool calls──▶ ExecutingTools
//!            │
//!        text reply
//!            ▼
//!          Done
//! ```
//!
//! 1. Build `[system prompt] + history + [user message]`
//! 2. Compact the conversation if it is over the token budget
//! 3. Call the model with the tool definitions
//! 4. Execute requested tool calls in emission order, appending one tool
//!    message per call, and loop back to step 2
//!
//! After `max_rounds` tool rounds the model is called once more with
//! `tool_choice = none`, and whatever text it returns ends the turn.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::message::Message;
use crate::providers::{GenerateOptions, ModelResponse, TokenUsage, ToolChoice};

use super::config::Agent;
use super::result::TurnResult;

/// States of a single turn.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TurnState {
    AwaitingModel,
    ExecutingTools,
    Done(Option<String>),
}

/// Per-turn counters.
#[derive(Debug, Default)]
struct TurnStats {
    rounds: usize,
    tool_rounds: usize,
    tool_calls: usize,
    compactions: usize,
    usage: TokenUsage,
}

/// Stateless driver for a conversation turn.
///
/// All per-turn state lives in [`Runner::run`], so one [`Agent`] can serve
/// concurrent turns.
#[derive(Debug, Clone, Copy)]
pub struct Runner;

impl Runner {
    /// Run one turn of `agent` for `input` on top of `history`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Llm`](crate::Error::Llm) when a model call fails with
    /// a non-retryable error or exhausts its retries. Tool and summarization
    /// failures never abort the turn.
    pub async fn run(agent: &Agent, input: &str, history: Vec<Message>) -> Result<TurnResult> {
        let has_system_prompt = !agent.config.system_prompt.is_empty();
        let mut messages = Vec::with_capacity(history.len() + 2);
        if has_system_prompt {
            messages.push(Message::system(agent.config.system_prompt.as_str()));
        }
        messages.extend(history);
        messages.push(Message::user(input));

        let mut stats = TurnStats::default();
        let mut state = TurnState::AwaitingModel;

        loop {
            state = match state {
                TurnState::AwaitingModel => {
                    messages = Self::fit_budget(agent, messages, &mut stats).await;
                    Self::await_model(agent, &mut messages, &mut stats).await?
                }
                TurnState::ExecutingTools => {
                    Self::execute_tools(agent, &mut messages, &mut stats).await;
                    TurnState::AwaitingModel
                }
                TurnState::Done(output) => {
                    debug!(
                        rounds = stats.rounds,
                        tool_calls = stats.tool_calls,
                        compactions = stats.compactions,
                        "Turn complete"
                    );
                    return Ok(TurnResult {
                        output,
                        messages,
                        rounds: stats.rounds,
                        tool_calls: stats.tool_calls,
                        compactions: stats.compactions,
                        usage: stats.usage,
                        has_system_prompt,
                    });
                }
            };
        }
    }

    /// Compact the conversation if it exceeds the token budget.
    async fn fit_budget(
        agent: &Agent,
        messages: Vec<Message>,
        stats: &mut TurnStats,
    ) -> Vec<Message> {
        let result = agent.compactor.compact_if_needed(messages).await;
        if result.is_compacted() {
            stats.compactions += 1;
            debug!(
                before = result.original_count,
                after = result.messages.len(),
                outcome = ?result.outcome,
                "Conversation compacted"
            );
        }
        result.messages
    }

    /// Call the model and decide the next state.
    async fn await_model(
        agent: &Agent,
        messages: &mut Vec<Message>,
        stats: &mut TurnStats,
    ) -> Result<TurnState> {
        let forced = stats.tool_rounds >= agent.config.max_rounds;
        let choice = if forced {
            ToolChoice::None
        } else {
            ToolChoice::Auto
        };
        let options = GenerateOptions::new()
            .with_tools(agent.tools.definitions().to_vec())
            .with_tool_choice(choice);

        stats.rounds += 1;
        debug!(
            provider = agent.model.provider(),
            model = agent.model.model_id(),
            round = stats.rounds,
            messages = messages.len(),
            forced,
            "Calling model"
        );

        let response = Self::generate_with_retry(agent, messages, options).await?;
        if let Some(usage) = response.token_usage {
            stats.usage += usage;
        }

        let mut message = response.message;
        if message.has_tool_calls() && !forced {
            messages.push(message);
            return Ok(TurnState::ExecutingTools);
        }

        if message.has_tool_calls() {
            warn!(
                ignored = message.tool_calls().len(),
                max_rounds = agent.config.max_rounds,
                "Tool round limit reached; ignoring further tool calls"
            );
        }
        message.tool_calls = None;
        let output = message.content.clone();
        messages.push(message);
        Ok(TurnState::Done(output))
    }

    /// Execute the tool calls of the last assistant message in order.
    async fn execute_tools(agent: &Agent, messages: &mut Vec<Message>, stats: &mut TurnStats) {
        let calls = messages
            .last()
            .map(|m| m.tool_calls().to_vec())
            .unwrap_or_default();

        for call in &calls {
            info!(tool = call.name(), id = %call.id, "Tool call");
            let outcome = agent.tools.invoke_call(call).await;
            messages.push(Message::tool(call.id.as_str(), outcome.to_content()));
            stats.tool_calls += 1;
        }
        stats.tool_rounds += 1;
    }

    /// Call the model, retrying retryable failures per the agent's policy.
    async fn generate_with_retry(
        agent: &Agent,
        messages: &[Message],
        options: GenerateOptions,
    ) -> Result<ModelResponse> {
        let retry = &agent.config.retry;
        let max_attempts = retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match agent.model.generate(messages.to_vec(), options.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = retry.delay_for_attempt(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Model call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
