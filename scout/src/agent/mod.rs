//! Agent module: the conversation driver and its context object.
//!
//! - **[`Agent`]** holds everything a turn needs (model, token counter,
//!   compactor, tools, prompt and limits). It is built once, usually via
//!   [`Agent::from_settings`], and passed explicitly to the driver.
//! - **[`Runner`]** is a stateless driver that takes one user message through
//!   the model/tool loop and returns a [`TurnResult`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scout::{agent::Agent, config::Settings};
//!
//! let agent = Agent::from_settings(&Settings::from_env()?)?;
//!
//! let turn = agent.run("What's the weather in Paris?", Vec::new()).await?;
//! println!("{}", turn.output.as_deref().unwrap_or_default());
//!
//! // Feed the conversation back in for the next turn.
//! let history = turn.into_history();
//! let reply = agent.chat("And tomorrow?", history).await?;
//! ```

mod config;
mod result;
mod runner;

pub use config::{Agent, AgentBuilder, AgentConfig};
pub use result::TurnResult;
pub use runner::Runner;
