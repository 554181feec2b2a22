//! Interactive REPL around a scout [`Agent`].
//!
//! The chatbot owns the cross-turn history. After every turn it replaces the
//! history with the turn's conversation (minus the system prompt), so
//! summaries produced by compaction carry over to later turns.

use std::io::{self, BufRead, Write};

use scout::agent::Agent;
use scout::message::Message;
use scout::providers::TokenUsage;

/// Configuration for the chatbot.
#[derive(Debug, Clone, Default)]
pub struct ChatBotConfig {
    /// Whether to display token usage after each response.
    pub show_usage: bool,
}

/// A line-oriented chatbot.
#[derive(Debug)]
pub struct ChatBot {
    agent: Agent,
    config: ChatBotConfig,
    history: Vec<Message>,
    last_usage: Option<TokenUsage>,
}

impl ChatBot {
    /// Create a new chatbot with the given agent and configuration.
    #[inline]
    pub const fn new(agent: Agent, config: ChatBotConfig) -> Self {
        Self {
            agent,
            config,
            history: Vec::new(),
            last_usage: None,
        }
    }

    /// Send one message and return the assistant's reply.
    ///
    /// History only advances when the turn succeeds.
    ///
    /// # Errors
    ///
    /// Propagates model failures from the agent.
    pub async fn chat(&mut self, prompt: &str) -> scout::Result<Option<String>> {
        let turn = self.agent.run(prompt, self.history.clone()).await?;
        self.last_usage = Some(turn.usage);
        let output = turn.output.clone();
        self.history = turn.into_history();
        Ok(output)
    }

    /// Run the interactive REPL on stdin/stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read or written.
    pub async fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        self.run_with(stdin.lock(), io::stdout()).await
    }

    /// Run the REPL over arbitrary input and output streams.
    ///
    /// # Errors
    ///
    /// Returns an error if `input` cannot be read or `out` cannot be written.
    pub async fn run_with<R, W>(&mut self, mut input: R, mut out: W) -> io::Result<()>
    where
        R: BufRead,
        W: Write,
    {
        writeln!(
            out,
            "Scout web-search chat (type 'exit' to quit, 'clear' to reset history)"
        )?;
        writeln!(out)?;

        loop {
            write!(out, "> ")?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }

            let line = line.trim();
            match line {
                "" => continue,
                "exit" | "quit" => break,
                "clear" => {
                    self.clear_history();
                    writeln!(out, "History cleared.")?;
                    continue;
                }
                _ => {}
            }

            writeln!(out)?;
            match self.chat(line).await {
                Ok(Some(reply)) => writeln!(out, "{reply}")?,
                Ok(None) => writeln!(out, "(no response)")?,
                Err(e) => writeln!(out, "error: {e}")?,
            }
            writeln!(out)?;

            if self.config.show_usage {
                if let Some(usage) = self.last_usage() {
                    writeln!(
                        out,
                        "[Tokens: {} in / {} out]",
                        usage.input_tokens, usage.output_tokens
                    )?;
                    writeln!(out)?;
                }
            }
        }

        Ok(())
    }

    /// Clear the conversation history.
    #[inline]
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// The conversation so far, without the system prompt.
    #[inline]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Get the last token usage.
    #[inline]
    pub const fn last_usage(&self) -> Option<&TokenUsage> {
        self.last_usage.as_ref()
    }
}
