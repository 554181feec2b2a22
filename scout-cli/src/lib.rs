//! Scout CLI library for interactive web-search conversations.
//!
//! This crate provides the terminal host for the scout agent.

pub mod chatbot;

pub use chatbot::{ChatBot, ChatBotConfig};
