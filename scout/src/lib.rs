#![cfg_attr(docsrs, feature(doc_cfg))]
//! Scout is a web-research chat agent: a conversation driver that lets an LLM
//! search the web and read pages, while keeping the conversation inside a
//! token budget by summarizing older turns.
//!
//! # Modules
//!
//! - [`agent`]: the [`Agent`](agent::Agent) context object and the
//!   [`Runner`](agent::Runner) conversation driver
//! - [`context`]: token counting and history compaction
//! - [`tool`] / [`tools`]: tool definitions, dispatch and the built-in handlers
//! - [`providers`]: the [`Model`](providers::Model) trait, `OpenAI` and mock models
//! - [`config`]: environment-driven [`Settings`](config::Settings)

pub mod agent;
pub mod config;
pub mod context;
pub mod error;
pub mod message;
pub mod prelude;
pub mod providers;
pub mod tool;
pub mod tools;

pub use error::{Error, Result};
