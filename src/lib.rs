//! Tycho — agent execution core
//!
//! Coordinates a conversational agent's interaction with a chat-completion
//! backend and a set of callable tools: conversation memory with three
//! retention policies, sequential or bounded-parallel tool dispatch with
//! per-task jitter and timeout, and a retrying turn loop that always comes
//! back with a printable answer.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tycho::prelude::*;
//!
//! # async fn example() -> tycho::error::Result<()> {
//! let client = Arc::new(OpenAiChatClient::from_env()?);
//! let mut agent = Agent::new(client, AgentConfig::default());
//! let answer = agent.process_turn("Hello!").await;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod tools;
pub mod types;
pub mod util;

pub use agent::{Agent, AgentStats};
pub use client::{ChatClient, ChatRequest, ChatResponse, OpenAiChatClient, ToolChoice};
pub use config::AgentConfig;
pub use conversation::{Conversation, HistoryBehavior};
pub use error::{Result, TychoError};
pub use executor::ToolExecutor;
pub use tools::{ClosureTool, FunctionSchema, Tool, ToolArguments, ToolRegistry};
pub use types::{ChatMessage, FailureKind, Role, ToolCall, ToolOutcome, Usage};
