//! Convenience re-exports for common use.

pub use crate::agent::Agent;
pub use crate::client::{ChatClient, ChatRequest, ChatResponse, OpenAiChatClient};
pub use crate::config::AgentConfig;
pub use crate::conversation::HistoryBehavior;
pub use crate::error::{Result, TychoError};
pub use crate::tools::{ClosureTool, FunctionSchema, Tool, ToolArguments, ToolRegistry};
pub use crate::types::{ChatMessage, FailureKind, Role, ToolCall, ToolOutcome, Usage};
