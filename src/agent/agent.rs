//! The agent turn loop.
//!
//! [`Agent::process_turn`] drives one user message to a final answer:
//! build the turn context, call the model (with retry), dispatch any
//! requested tool calls, feed the results back, and repeat up to the
//! iteration cap. A turn always yields a printable string, never an
//! error, and always folds the transcript into cross-turn memory exactly
//! once, whatever the exit path.
//!
//! # Example
//!
//! ```ignore
//! let client = Arc::new(OpenAiChatClient::from_env()?);
//! let mut agent = Agent::new(client, AgentConfig::default())
//!     .with_system_prompt("You are a terse assistant.")
//!     .with_tool(weather_tool());
//!
//! let answer = agent.process_turn("What's the weather in Oslo?").await;
//! println!("{answer}");
//! ```

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{ChatClient, ChatRequest, ChatResponse};
use crate::config::AgentConfig;
use crate::conversation::Conversation;
use crate::error::Result;
use crate::executor::ToolExecutor;
use crate::tools::{Tool, ToolRegistry};
use crate::types::ChatMessage;
use crate::util::RetryPolicy;

use super::stats::AgentStats;

/// Assistant fragments shorter than this are left out of salvage.
const SALVAGE_MIN_FRAGMENT_CHARS: usize = 20;

/// A conversational agent: one model backend, a set of tools, and the
/// memory of previous turns.
pub struct Agent {
    client: Arc<dyn ChatClient>,
    config: AgentConfig,
    system_prompt: Option<String>,
    registry: ToolRegistry,
    conversation: Conversation,
    executor: ToolExecutor,
    stats: AgentStats,
    retry: RetryPolicy,
}

impl Agent {
    pub fn new(client: Arc<dyn ChatClient>, config: AgentConfig) -> Self {
        let executor = ToolExecutor::new(&config);
        let retry = RetryPolicy::new(config.max_retries, config.retry_delay);
        Self {
            client,
            config,
            system_prompt: None,
            registry: ToolRegistry::new(),
            conversation: Conversation::new(),
            executor,
            stats: AgentStats::new(),
            retry,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.registry.register(tool);
        self
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        for tool in tools {
            self.registry.register(tool);
        }
        self
    }

    /// Run one full turn. Never panics and never returns an error: every
    /// exit path produces a string the caller can show.
    pub async fn process_turn(&mut self, user_message: &str) -> String {
        let turn_id = Uuid::new_v4();
        let behavior = self.config.history_behavior;

        // A tool-less agent cannot make progress by iterating.
        let max_iterations = if self.registry.is_empty() {
            1
        } else {
            self.config.max_iterations
        };

        info!(
            %turn_id,
            model = %self.config.model,
            max_iterations,
            history = %behavior,
            "starting turn"
        );

        self.conversation
            .begin_turn(self.system_prompt.as_deref(), user_message, behavior);

        let mut iteration: u32 = 0;
        while iteration < max_iterations {
            iteration += 1;

            let response = match self.call_model(turn_id).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(%turn_id, iteration, error = %e, "model call failed after retries");
                    self.conversation.cleanup_history(behavior);
                    return format!("Error: no response from the model backend. ({e})");
                }
            };

            if response.is_empty() {
                info!(%turn_id, iteration, "model returned neither content nor tool calls");
                self.conversation.cleanup_history(behavior);
                return "No response generated.".to_string();
            }

            if let Some(calls) = response.tool_calls.as_ref().filter(|c| !c.is_empty()) {
                // A call with no id or name cannot be joined back to a
                // tool message, and the outcome constructors reject empty
                // identity.
                if calls.iter().any(|c| c.id.is_empty() || c.name.is_empty()) {
                    warn!(%turn_id, iteration, "tool call without id or function name");
                    self.conversation.cleanup_history(behavior);
                    return "Error: malformed response from the model backend.".to_string();
                }

                debug!(%turn_id, iteration, tool_calls = calls.len(), "dispatching tool calls");

                self.conversation
                    .append(ChatMessage::assistant_tool_calls(calls.clone()));

                let outcomes = self.executor.execute_all(calls, &self.registry).await;

                let mut unknown_tool = false;
                for outcome in outcomes {
                    if outcome.is_not_found() {
                        unknown_tool = true;
                    }
                    self.conversation.append(outcome.to_message());
                }

                if unknown_tool {
                    // The not-found message is already in the transcript,
                    // so the model can correct itself on the next call
                    // without the detour counting against the cap.
                    warn!(%turn_id, iteration, "unknown tool requested; rewinding iteration");
                    iteration -= 1;
                }
                continue;
            }

            // Neither empty nor tool-calling, so text is present.
            let content = response.content.unwrap_or_default();
            info!(%turn_id, iteration, "turn finished with a final answer");
            self.conversation.append(ChatMessage::assistant(content.clone()));
            self.conversation.cleanup_history(behavior);
            return content;
        }

        let answer = self.salvage_answer(turn_id);
        self.conversation.cleanup_history(behavior);
        answer
    }

    /// One logical model call: build the request from the current
    /// transcript and run it through the retry policy. Every physical
    /// attempt is recorded in the stats.
    async fn call_model(&self, turn_id: Uuid) -> Result<ChatResponse> {
        let request = ChatRequest::builder()
            .model(self.config.model.clone())
            .messages(self.conversation.ephemeral().to_vec())
            .tools(self.registry.schemas())
            .maybe_temperature(self.config.temperature)
            .build();

        let client = &*self.client;
        let stats = &self.stats;
        let request_ref = &request;

        self.retry
            .execute(move || async move {
                let started = Instant::now();
                let result = client.chat(request_ref).await;
                let latency_ms = started.elapsed().as_millis() as u64;

                stats.record_llm_attempt(latency_ms);
                if let Ok(response) = &result {
                    stats.record_tokens(response.usage.total_tokens);
                }

                debug!(
                    %turn_id,
                    latency_ms,
                    ok = result.is_ok(),
                    "model call attempt"
                );
                result
            })
            .await
    }

    /// Best-effort answer from whatever the turn gathered: tool outputs
    /// keyed by tool name plus any substantial assistant prose.
    fn salvage_answer(&self, turn_id: Uuid) -> String {
        let tool_results = self.conversation.extract_tool_results_by_name();
        let fragments = self
            .conversation
            .extract_assistant_fragments(SALVAGE_MIN_FRAGMENT_CHARS);

        if tool_results.is_empty() && fragments.is_empty() {
            warn!(%turn_id, "iteration cap reached with nothing to salvage");
            return "I wasn't able to complete the request within the allowed number of steps."
                .to_string();
        }

        warn!(
            %turn_id,
            tool_results = tool_results.len(),
            fragments = fragments.len(),
            "iteration cap reached; salvaging partial results"
        );

        let mut answer = String::from(
            "I couldn't finish within the allowed number of steps. Here is what I gathered:\n",
        );

        let mut names: Vec<&String> = tool_results.keys().collect();
        names.sort();
        for name in names {
            answer.push_str(&format!("\n[{name}]\n{}\n", tool_results[name]));
        }
        for fragment in &fragments {
            answer.push_str(&format!("\n{fragment}\n"));
        }
        answer
    }

    /// Forget everything, both the current transcript and cross-turn
    /// memory.
    pub fn clear_conversation(&mut self) {
        self.conversation.clear();
    }

    /// Zero all counters, including the tool invocation counter.
    pub fn reset_stats(&self) {
        self.stats.reset();
        self.executor.reset_tool_call_count();
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn total_tool_calls(&self) -> u64 {
        self.executor.total_tool_calls()
    }

    pub fn total_llm_calls(&self) -> u64 {
        self.stats.total_llm_calls()
    }

    pub fn total_latency_ms(&self) -> u64 {
        self.stats.total_latency_ms()
    }

    pub fn total_tokens_used(&self) -> u64 {
        self.stats.total_tokens_used()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("model", &self.config.model)
            .field("tools", &self.registry.names())
            .field("history", &self.config.history_behavior)
            .finish()
    }
}
