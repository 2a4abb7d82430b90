//! Model backend abstraction and the OpenAI-compatible implementation.

pub mod openai;

use async_trait::async_trait;
use bon::Builder;

use crate::error::Result;
use crate::tools::FunctionSchema;
use crate::types::{ChatMessage, ToolCall, Usage};

pub use openai::OpenAiChatClient;

/// How the model is allowed to use the advertised tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    /// Model decides whether to call tools.
    Auto,
    /// Model must not call tools.
    None,
    /// Model must call at least one tool.
    Required,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
            ToolChoice::Required => "required",
        }
    }
}

/// One chat completion request.
#[derive(Debug, Clone, Builder)]
pub struct ChatRequest {
    /// Model identifier, passed through verbatim.
    #[builder(into)]
    pub model: String,
    /// Full message context for this call.
    pub messages: Vec<ChatMessage>,
    /// Schemas of the tools the model may call.
    #[builder(default)]
    pub tools: Vec<FunctionSchema>,
    pub tool_choice: Option<ToolChoice>,
    pub temperature: Option<f64>,
}

/// One chat completion response.
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    /// Assistant text, if any.
    pub content: Option<String>,
    /// Tool calls requested by the model, if any. Normalized so that
    /// `Some` always holds at least one call.
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Token accounting reported by the backend.
    pub usage: Usage,
}

impl ChatResponse {
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }

    /// True when the response carries neither text nor tool calls.
    pub fn is_empty(&self) -> bool {
        !self.has_tool_calls() && self.content.as_deref().map_or(true, |c| c.is_empty())
    }
}

/// A chat completion backend.
///
/// Implementations return `Err` for transport and API failures; the agent
/// loop decides whether to retry based on [`crate::TychoError::is_retryable`].
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;
}
