//! Conversation state: the per-turn transcript and cross-turn memory.
//!
//! A [`Conversation`] owns two message sequences. `ephemeral` is rebuilt at
//! the start of every turn and holds the full working transcript for that
//! turn, including tool traffic. `persistent` survives across turns and is
//! rewritten at the end of every turn according to the active
//! [`HistoryBehavior`].

use std::collections::HashMap;

use chrono::Local;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{ChatMessage, Role};

/// Prefix of the synthetic assistant message stating the wall-clock time.
/// Messages carrying it are filtered out of retained context.
pub const TIME_MARKER: &str = "Current date and time: ";

/// Cross-turn retention policy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HistoryBehavior {
    /// Stateless: nothing survives the turn.
    None,
    /// At most one user + assistant pair survives.
    #[default]
    Last,
    /// The whole transcript survives, tool messages included.
    Full,
}

/// Conversation memory for a single agent instance.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    ephemeral: Vec<ChatMessage>,
    persistent: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current turn's transcript.
    pub fn ephemeral(&self) -> &[ChatMessage] {
        &self.ephemeral
    }

    /// The cross-turn memory as left by the last `cleanup_history`.
    pub fn persistent(&self) -> &[ChatMessage] {
        &self.persistent
    }

    /// Assemble the opening transcript for a new turn. Pure with respect to
    /// stored state. Emits, in order: the system message (when given),
    /// retained context per `behavior`, a synthetic timestamp assistant
    /// message, and the new user message.
    pub fn build_context_for_turn(
        &self,
        system_prompt: Option<&str>,
        user_message: &str,
        behavior: HistoryBehavior,
    ) -> Vec<ChatMessage> {
        let mut context = Vec::new();

        if let Some(prompt) = system_prompt {
            context.push(ChatMessage::system(prompt));
        }

        match behavior {
            HistoryBehavior::None => {}
            HistoryBehavior::Last => {
                // Independent backward scans: the retained user and
                // assistant messages may come from different exchanges.
                if let Some(user) = self.persistent.iter().rev().find(|m| m.role == Role::User) {
                    context.push(user.clone());
                }
                if let Some(assistant) =
                    self.persistent.iter().rev().find(|m| is_qualifying_assistant(m))
                {
                    context.push(assistant.clone());
                }
            }
            HistoryBehavior::Full => {
                context.extend(
                    self.persistent
                        .iter()
                        .filter(|m| m.role != Role::System && !is_timestamp_marker(m))
                        .cloned(),
                );
            }
        }

        context.push(timestamp_message());
        context.push(ChatMessage::user(user_message));
        context
    }

    /// Start a turn: replace `ephemeral` with a freshly built context.
    pub fn begin_turn(
        &mut self,
        system_prompt: Option<&str>,
        user_message: &str,
        behavior: HistoryBehavior,
    ) {
        self.ephemeral = self.build_context_for_turn(system_prompt, user_message, behavior);
    }

    /// Append a message to the current turn's transcript.
    pub fn append(&mut self, message: ChatMessage) {
        self.ephemeral.push(message);
    }

    /// Fold the turn's transcript into cross-turn memory. Must run exactly
    /// once at the end of every turn, on every exit path.
    pub fn cleanup_history(&mut self, behavior: HistoryBehavior) {
        match behavior {
            HistoryBehavior::None => self.persistent.clear(),
            HistoryBehavior::Last => {
                let user = self
                    .ephemeral
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::User)
                    .cloned();
                let assistant = self
                    .ephemeral
                    .iter()
                    .rev()
                    .find(|m| is_qualifying_assistant(m))
                    .cloned();
                self.persistent.clear();
                // Chronological order even when one side is missing.
                self.persistent.extend(user);
                self.persistent.extend(assistant);
            }
            HistoryBehavior::Full => {
                // Verbatim copy, tool messages included. System and
                // timestamp messages are filtered at build time instead.
                self.persistent = self.ephemeral.clone();
            }
        }
    }

    /// Tool outputs recorded this turn, keyed by tool name. When a tool ran
    /// more than once the latest output wins.
    pub fn extract_tool_results_by_name(&self) -> HashMap<String, String> {
        let mut results = HashMap::new();
        for msg in &self.ephemeral {
            if msg.role == Role::Tool {
                if let (Some(name), Some(content)) = (&msg.name, &msg.content) {
                    results.insert(name.clone(), content.clone());
                }
            }
        }
        results
    }

    /// Assistant prose recorded this turn, skipping timestamp-marker
    /// messages and fragments shorter than `min_chars`.
    pub fn extract_assistant_fragments(&self, min_chars: usize) -> Vec<String> {
        self.ephemeral
            .iter()
            .filter(|m| m.role == Role::Assistant && !is_timestamp_marker(m))
            .filter_map(|m| m.content.as_deref())
            .filter(|c| c.chars().count() >= min_chars)
            .map(str::to_string)
            .collect()
    }

    /// Drop everything, both per-turn and cross-turn.
    pub fn clear(&mut self) {
        self.ephemeral.clear();
        self.persistent.clear();
    }
}

/// An assistant message eligible for retention: real prose, no tool calls,
/// not the synthetic timestamp.
fn is_qualifying_assistant(msg: &ChatMessage) -> bool {
    msg.role == Role::Assistant
        && msg.tool_calls.is_none()
        && msg
            .content
            .as_deref()
            .is_some_and(|c| !c.is_empty() && !c.contains(TIME_MARKER))
}

fn is_timestamp_marker(msg: &ChatMessage) -> bool {
    msg.role == Role::Assistant
        && msg.content.as_deref().is_some_and(|c| c.contains(TIME_MARKER))
}

fn timestamp_message() -> ChatMessage {
    let now = Local::now().format("%A, %B %d, %Y at %I:%M %p");
    ChatMessage::assistant(format!("{TIME_MARKER}{now}"))
}
