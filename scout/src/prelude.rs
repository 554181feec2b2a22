//! Commonly used types.

pub use crate::agent::{Agent, AgentConfig, Runner, TurnResult};
pub use crate::config::Settings;
pub use crate::context::{CompactionConfig, HistoryCompactor, TokenCounter, TokenizerKind};
pub use crate::error::{Error, LlmError, Result, ToolError};
pub use crate::message::{Message, Role, ToolCall};
pub use crate::providers::{Model, RetryConfig};
pub use crate::tool::{ToolInvoker, ToolName, ToolOutcome};
