//! Tool execution engine: sequential and bounded-parallel dispatch.
//!
//! Every requested invocation produces exactly one [`ToolOutcome`], in the
//! original request order, no matter how it failed. Failures never abort
//! the rest of the batch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::AgentConfig;
use crate::tools::{Tool, ToolArguments, ToolRegistry};
use crate::types::{FailureKind, ToolCall, ToolOutcome};
use crate::util::retry::rand_factor;

/// Appended to tool output cut at the configured length cap.
pub const TRUNCATION_MARKER: &str = "\n\n[TOOL OUTPUT TRUNCATED]";

/// Extra allowance when waiting out a parallel task, on top of the maximum
/// jitter and the per-task timeout. A task still pending past this is
/// aborted.
const BATCH_GRACE: Duration = Duration::from_secs(5);

/// Dispatches model-requested tool invocations.
#[derive(Debug)]
pub struct ToolExecutor {
    max_concurrent_tools: usize,
    tool_timeout: Duration,
    jitter_max: Duration,
    max_response_length: usize,
    invocations: AtomicU64,
}

impl ToolExecutor {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            max_concurrent_tools: config.max_concurrent_tools,
            tool_timeout: config.tool_timeout,
            jitter_max: config.tool_start_jitter_max,
            max_response_length: config.max_tool_response_length,
            invocations: AtomicU64::new(0),
        }
    }

    /// Invocations attempted so far, counting not-found and timed-out ones.
    pub fn total_tool_calls(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    pub fn reset_tool_call_count(&self) {
        self.invocations.store(0, Ordering::Relaxed);
    }

    /// Execute a batch of tool calls, returning one outcome per call in the
    /// order the calls were given.
    pub async fn execute_all(
        &self,
        calls: &[ToolCall],
        registry: &ToolRegistry,
    ) -> Vec<ToolOutcome> {
        if calls.is_empty() {
            return Vec::new();
        }

        if calls.len() <= 1 || self.max_concurrent_tools <= 1 {
            self.execute_sequential(calls, registry).await
        } else {
            self.execute_parallel(calls, registry).await
        }
    }

    /// One at a time, in order, each on its own task so a panicking tool
    /// surfaces as an execution-error outcome instead of unwinding the
    /// batch. No per-task timeout on this path.
    async fn execute_sequential(
        &self,
        calls: &[ToolCall],
        registry: &ToolRegistry,
    ) -> Vec<ToolOutcome> {
        debug!(count = calls.len(), "executing tool calls sequentially");

        let mut outcomes = Vec::with_capacity(calls.len());
        for call in calls {
            self.invocations.fetch_add(1, Ordering::Relaxed);
            let tool = registry.get(&call.name);
            let handle = tokio::spawn(invoke_call(call.clone(), tool, self.max_response_length));
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    warn!(tool = %call.name, error = %join_err, "tool task failed to join");
                    ToolOutcome::failure(
                        &call.name,
                        &call.id,
                        FailureKind::ExecutionError,
                        format!("Tool execution failed: {join_err}"),
                    )
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Tokio tasks gated by a semaphore sized to the worker pool. Results
    /// are collected by awaiting the handles in submission order, each
    /// bounded by a grace deadline so the pool is fully torn down before
    /// returning.
    async fn execute_parallel(
        &self,
        calls: &[ToolCall],
        registry: &ToolRegistry,
    ) -> Vec<ToolOutcome> {
        let pool_size = self.max_concurrent_tools.min(calls.len());
        let semaphore = Arc::new(Semaphore::new(pool_size));

        debug!(
            count = calls.len(),
            pool = pool_size,
            "executing tool calls in parallel"
        );

        let mut handles = Vec::with_capacity(calls.len());
        for (index, call) in calls.iter().enumerate() {
            self.invocations.fetch_add(1, Ordering::Relaxed);

            let semaphore = Arc::clone(&semaphore);
            let jitter = self.start_jitter(index);
            let timeout = self.tool_timeout;
            let max_len = self.max_response_length;
            let tool = registry.get(&call.name);
            let call = call.clone();

            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return ToolOutcome::failure(
                            &call.name,
                            &call.id,
                            FailureKind::ExecutionError,
                            "Tool execution failed: worker pool unavailable",
                        );
                    }
                };

                if !jitter.is_zero() {
                    tokio::time::sleep(jitter).await;
                }

                let name = call.name.clone();
                let id = call.id.clone();
                match tokio::time::timeout(timeout, invoke_call(call, tool, max_len)).await {
                    Ok(outcome) => outcome,
                    Err(_) => ToolOutcome::failure(
                        &name,
                        &id,
                        FailureKind::Timeout,
                        "Tool execution timed out",
                    ),
                }
            }));
        }

        // Per-task wait budget; earlier waits cover time the later tasks
        // spent queued on the semaphore.
        let wait_budget = self.jitter_max + self.tool_timeout + BATCH_GRACE;

        let mut outcomes = Vec::with_capacity(calls.len());
        for (call, handle) in calls.iter().zip(handles) {
            let abort = handle.abort_handle();
            let outcome = match tokio::time::timeout(wait_budget, handle).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(join_err)) => {
                    warn!(tool = %call.name, error = %join_err, "tool task failed to join");
                    ToolOutcome::failure(
                        &call.name,
                        &call.id,
                        FailureKind::ExecutionError,
                        format!("Tool execution failed: {join_err}"),
                    )
                }
                Err(_) => {
                    abort.abort();
                    warn!(tool = %call.name, "tool task overran the batch grace deadline");
                    ToolOutcome::failure(
                        &call.name,
                        &call.id,
                        FailureKind::Timeout,
                        "Tool execution timed out",
                    )
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Start delay for the task at `index`:
    /// `min(jitter_max, index * 0.1 + uniform(0, 0.2))` seconds. Zero when
    /// jitter is disabled.
    fn start_jitter(&self, index: usize) -> Duration {
        let max = self.jitter_max.as_secs_f64();
        if max <= 0.0 {
            return Duration::ZERO;
        }
        let raw = index as f64 * 0.1 + rand_factor() * 0.2;
        Duration::from_secs_f64(raw.min(max))
    }
}

/// One invocation: decode arguments, look up, invoke, cap the output.
/// Every failure mode maps to a failure outcome carrying this call's own
/// name and id.
async fn invoke_call(
    call: ToolCall,
    tool: Option<Arc<dyn Tool>>,
    max_response_length: usize,
) -> ToolOutcome {
    let args = match ToolArguments::from_raw(&call.arguments) {
        Ok(args) => args,
        Err(e) => {
            return ToolOutcome::failure(
                &call.name,
                &call.id,
                FailureKind::ExecutionError,
                format!("Tool execution failed: {e}"),
            );
        }
    };

    let Some(tool) = tool else {
        return ToolOutcome::failure(
            &call.name,
            &call.id,
            FailureKind::NotFound,
            format!("Tool '{}' not found", call.name),
        );
    };

    debug!(tool = %call.name, call_id = %call.id, "invoking tool");

    match tool.invoke(&args).await {
        Ok(output) => ToolOutcome::success(
            &call.name,
            &call.id,
            truncate_output(output, max_response_length),
        ),
        Err(e) => ToolOutcome::failure(
            &call.name,
            &call.id,
            FailureKind::ExecutionError,
            format!("Tool execution failed: {e}"),
        ),
    }
}

/// Cap output at `max_chars` characters, marking the cut.
fn truncate_output(output: String, max_chars: usize) -> String {
    if output.chars().count() <= max_chars {
        return output;
    }
    debug!(max_chars, "truncating tool output");
    let mut truncated: String = output.chars().take(max_chars).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
