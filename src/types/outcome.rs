//! Validated outcome of a single tool invocation.

use strum::Display;

use super::message::ChatMessage;

/// Failure classification for a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// No registered tool advertises the requested function name.
    NotFound,
    /// The tool ran and failed, or its arguments were malformed.
    ExecutionError,
    /// The invocation exceeded the per-task deadline.
    Timeout,
}

/// The outcome of one tool invocation: success with output, or a typed
/// failure. Exactly one variant is populated and the value is immutable
/// once constructed; `name` and `tool_call_id` are always non-empty.
///
/// Construction goes through [`ToolOutcome::success`] and
/// [`ToolOutcome::failure`], which panic on an empty identity or an empty
/// failure message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    name: String,
    tool_call_id: String,
    payload: Payload,
}

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Success { output: String },
    Failure { kind: FailureKind, message: String },
}

impl ToolOutcome {
    /// Create a successful outcome.
    pub fn success(
        name: impl Into<String>,
        tool_call_id: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let tool_call_id = tool_call_id.into();
        assert!(!name.is_empty(), "tool outcome requires a function name");
        assert!(
            !tool_call_id.is_empty(),
            "tool outcome requires a tool call id"
        );
        Self {
            name,
            tool_call_id,
            payload: Payload::Success {
                output: output.into(),
            },
        }
    }

    /// Create a failed outcome.
    pub fn failure(
        name: impl Into<String>,
        tool_call_id: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let tool_call_id = tool_call_id.into();
        assert!(!name.is_empty(), "tool outcome requires a function name");
        assert!(
            !tool_call_id.is_empty(),
            "tool outcome requires a tool call id"
        );
        let message = message.into();
        assert!(!message.is_empty(), "tool failure requires a message");
        Self {
            name,
            tool_call_id,
            payload: Payload::Failure { kind, message },
        }
    }

    /// The function name this outcome belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The id of the tool call that produced this outcome.
    pub fn tool_call_id(&self) -> &str {
        &self.tool_call_id
    }

    pub fn is_success(&self) -> bool {
        matches!(self.payload, Payload::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Whether this is a `NotFound` failure (the agent loop treats those
    /// as correctable input rather than progress).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.payload,
            Payload::Failure {
                kind: FailureKind::NotFound,
                ..
            }
        )
    }

    /// The tool output, when successful.
    pub fn output(&self) -> Option<&str> {
        match &self.payload {
            Payload::Success { output } => Some(output),
            Payload::Failure { .. } => None,
        }
    }

    /// The failure classification, when failed.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.payload {
            Payload::Success { .. } => None,
            Payload::Failure { kind, .. } => Some(*kind),
        }
    }

    /// The failure message, when failed.
    pub fn message(&self) -> Option<&str> {
        match &self.payload {
            Payload::Success { .. } => None,
            Payload::Failure { message, .. } => Some(message),
        }
    }

    /// Render as a `Role::Tool` conversation message carrying the output
    /// on success and the failure message otherwise.
    pub fn to_message(&self) -> ChatMessage {
        let text = match &self.payload {
            Payload::Success { output } => output.clone(),
            Payload::Failure { message, .. } => message.clone(),
        };
        ChatMessage::tool(self.tool_call_id.clone(), self.name.clone(), text)
    }
}
