//! Tool execution engine tests: ordering, bounding, timeouts, failures.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{counting_tool, echo_tool, failing_tool, sleeping_tool, verbose_tool, weather_tool};
use serde_json::json;
use tycho::executor::TRUNCATION_MARKER;
use tycho::{
    AgentConfig, ClosureTool, FailureKind, FunctionSchema, Tool, ToolCall, ToolExecutor,
    ToolRegistry,
};

fn config(max_concurrent: usize) -> AgentConfig {
    AgentConfig::builder()
        .model("test-model")
        .max_concurrent_tools(max_concurrent)
        .tool_timeout(Duration::from_secs(5))
        .tool_start_jitter_max(Duration::ZERO)
        .build()
}

fn echo_call(id: &str, text: &str) -> ToolCall {
    ToolCall::new(id, "echo", json!({ "text": text }).to_string())
}

/// Panics on every invocation.
fn panicking_tool(name: &str) -> Arc<dyn Tool> {
    Arc::new(ClosureTool::new(
        FunctionSchema::new(name, "Always panics"),
        |_args| async { panic!("tool blew up") },
    ))
}

/// Tracks how many invocations overlap, for asserting the pool bound.
fn gauge_tool(current: Arc<AtomicUsize>, peak: Arc<AtomicUsize>) -> Arc<dyn Tool> {
    Arc::new(ClosureTool::new(
        FunctionSchema::new("gauge", "Track concurrent executions"),
        move |_args| {
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok("done".to_string())
            }
        },
    ))
}

#[tokio::test]
async fn empty_batch_yields_nothing_and_counts_nothing() {
    let executor = ToolExecutor::new(&config(4));
    let registry = ToolRegistry::new();

    let outcomes = executor.execute_all(&[], &registry).await;

    assert!(outcomes.is_empty());
    assert_eq!(executor.total_tool_calls(), 0);
}

#[tokio::test]
async fn sequential_results_keep_request_order() {
    let executor = ToolExecutor::new(&config(1));
    let mut registry = ToolRegistry::new();
    registry.register(echo_tool());

    let calls = vec![
        echo_call("c1", "first"),
        echo_call("c2", "second"),
        echo_call("c3", "third"),
    ];
    let outcomes = executor.execute_all(&calls, &registry).await;

    assert_eq!(outcomes.len(), 3);
    for (outcome, call) in outcomes.iter().zip(&calls) {
        assert!(outcome.is_success());
        assert_eq!(outcome.tool_call_id(), call.id);
    }
    assert_eq!(outcomes[0].output(), Some("first"));
    assert_eq!(outcomes[2].output(), Some("third"));
}

#[tokio::test]
async fn parallel_results_keep_request_order_under_mixed_failure() {
    let executor = ToolExecutor::new(&config(4));
    let mut registry = ToolRegistry::new();
    registry.register(echo_tool());
    registry.register(failing_tool("broken"));

    let calls = vec![
        echo_call("c1", "alpha"),
        ToolCall::new("c2", "broken", "{}"),
        ToolCall::new("c3", "ghost", "{}"),
        echo_call("c4", "omega"),
    ];
    let outcomes = executor.execute_all(&calls, &registry).await;

    let ids: Vec<&str> = outcomes.iter().map(|o| o.tool_call_id()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3", "c4"]);

    assert_eq!(outcomes[0].output(), Some("alpha"));
    assert_eq!(outcomes[1].failure_kind(), Some(FailureKind::ExecutionError));
    assert_eq!(outcomes[2].failure_kind(), Some(FailureKind::NotFound));
    assert_eq!(outcomes[3].output(), Some("omega"));
}

#[tokio::test]
async fn parallel_execution_overlaps_in_time() {
    let executor = ToolExecutor::new(&config(2));
    let mut registry = ToolRegistry::new();
    registry.register(sleeping_tool("nap", Duration::from_millis(100)));

    let calls = vec![
        ToolCall::new("c1", "nap", "{}"),
        ToolCall::new("c2", "nap", "{}"),
    ];

    let started = Instant::now();
    let outcomes = executor.execute_all(&calls, &registry).await;
    let elapsed = started.elapsed();

    assert!(outcomes.iter().all(|o| o.is_success()));
    // Two 100ms sleeps run side by side, nowhere near the 200ms sum.
    assert!(elapsed < Duration::from_millis(180), "took {elapsed:?}");
}

#[tokio::test]
async fn pool_size_bounds_concurrent_invocations() {
    let executor = ToolExecutor::new(&config(2));
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut registry = ToolRegistry::new();
    registry.register(gauge_tool(Arc::clone(&current), Arc::clone(&peak)));

    let calls: Vec<ToolCall> = (0..4)
        .map(|i| ToolCall::new(format!("c{i}"), "gauge", "{}"))
        .collect();
    let outcomes = executor.execute_all(&calls, &registry).await;

    assert!(outcomes.iter().all(|o| o.is_success()));
    assert!(peak.load(Ordering::SeqCst) <= 2, "peak {:?}", peak);
    assert_eq!(current.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn start_jitter_delays_parallel_tasks() {
    let config = AgentConfig::builder()
        .model("test-model")
        .max_concurrent_tools(4)
        .tool_timeout(Duration::from_secs(5))
        .tool_start_jitter_max(Duration::from_millis(200))
        .build();
    let executor = ToolExecutor::new(&config);
    let mut registry = ToolRegistry::new();
    registry.register(echo_tool());

    let calls = vec![echo_call("c1", "a"), echo_call("c2", "b")];

    let started = Instant::now();
    let outcomes = executor.execute_all(&calls, &registry).await;
    let elapsed = started.elapsed();

    assert!(outcomes.iter().all(|o| o.is_success()));
    // The second task's jitter floor is index * 0.1 seconds.
    assert!(elapsed >= Duration::from_millis(100), "took {elapsed:?}");
}

#[tokio::test]
async fn parallel_timeout_reports_the_right_call_identity() {
    let config = AgentConfig::builder()
        .model("test-model")
        .max_concurrent_tools(4)
        .tool_timeout(Duration::from_millis(100))
        .tool_start_jitter_max(Duration::ZERO)
        .build();
    let executor = ToolExecutor::new(&config);
    let mut registry = ToolRegistry::new();
    registry.register(sleeping_tool("slow", Duration::from_secs(30)));
    registry.register(echo_tool());

    let calls = vec![
        ToolCall::new("c1", "slow", "{}"),
        echo_call("c2", "quick"),
    ];
    let outcomes = executor.execute_all(&calls, &registry).await;

    assert_eq!(outcomes[0].failure_kind(), Some(FailureKind::Timeout));
    assert_eq!(outcomes[0].name(), "slow");
    assert_eq!(outcomes[0].tool_call_id(), "c1");
    assert_eq!(outcomes[0].message(), Some("Tool execution timed out"));

    assert!(outcomes[1].is_success());
    assert_eq!(outcomes[1].output(), Some("quick"));
}

#[tokio::test]
async fn sequential_path_applies_no_timeout() {
    let config = AgentConfig::builder()
        .model("test-model")
        .max_concurrent_tools(1)
        .tool_timeout(Duration::from_millis(100))
        .tool_start_jitter_max(Duration::ZERO)
        .build();
    let executor = ToolExecutor::new(&config);
    let mut registry = ToolRegistry::new();
    registry.register(sleeping_tool("nap", Duration::from_millis(300)));

    let calls = vec![
        ToolCall::new("c1", "nap", "{}"),
        ToolCall::new("c2", "nap", "{}"),
    ];
    let outcomes = executor.execute_all(&calls, &registry).await;

    // 300ms sleeps outlive the 100ms timeout, which only binds the
    // parallel strategy.
    assert!(outcomes.iter().all(|o| o.is_success()));
}

#[tokio::test]
async fn single_call_batches_take_the_sequential_path() {
    let config = AgentConfig::builder()
        .model("test-model")
        .max_concurrent_tools(8)
        .tool_timeout(Duration::from_millis(100))
        .tool_start_jitter_max(Duration::ZERO)
        .build();
    let executor = ToolExecutor::new(&config);
    let mut registry = ToolRegistry::new();
    registry.register(sleeping_tool("nap", Duration::from_millis(300)));

    let calls = vec![ToolCall::new("c1", "nap", "{}")];
    let outcomes = executor.execute_all(&calls, &registry).await;

    assert!(outcomes[0].is_success());
    assert_eq!(outcomes[0].output(), Some("woke up"));
}

#[tokio::test]
async fn unknown_tool_yields_not_found_with_exact_message() {
    let executor = ToolExecutor::new(&config(1));
    let registry = ToolRegistry::new();

    let calls = vec![ToolCall::new("c1", "ghost", "{}")];
    let outcomes = executor.execute_all(&calls, &registry).await;

    assert_eq!(outcomes[0].failure_kind(), Some(FailureKind::NotFound));
    assert_eq!(outcomes[0].message(), Some("Tool 'ghost' not found"));
    assert!(outcomes[0].is_not_found());
}

#[tokio::test]
async fn tool_errors_become_execution_failures() {
    let executor = ToolExecutor::new(&config(1));
    let mut registry = ToolRegistry::new();
    registry.register(failing_tool("broken"));

    let calls = vec![ToolCall::new("c1", "broken", "{}")];
    let outcomes = executor.execute_all(&calls, &registry).await;

    assert_eq!(outcomes[0].failure_kind(), Some(FailureKind::ExecutionError));
    let message = outcomes[0].message().unwrap();
    assert!(
        message.starts_with("Tool execution failed: "),
        "unexpected message: {message}"
    );
    assert!(message.contains("boom"));
}

#[tokio::test]
async fn a_panicking_tool_does_not_abort_the_sequential_batch() {
    let executor = ToolExecutor::new(&config(1));
    let mut registry = ToolRegistry::new();
    registry.register(panicking_tool("volatile"));
    registry.register(echo_tool());

    let calls = vec![
        ToolCall::new("c1", "volatile", "{}"),
        echo_call("c2", "still fine"),
    ];
    let outcomes = executor.execute_all(&calls, &registry).await;

    assert_eq!(outcomes[0].failure_kind(), Some(FailureKind::ExecutionError));
    assert_eq!(outcomes[0].name(), "volatile");
    assert_eq!(outcomes[0].tool_call_id(), "c1");
    let message = outcomes[0].message().unwrap();
    assert!(
        message.starts_with("Tool execution failed: "),
        "unexpected message: {message}"
    );
    assert!(message.contains("panicked"));

    assert_eq!(outcomes[1].output(), Some("still fine"));
    assert_eq!(executor.total_tool_calls(), 2);
}

#[tokio::test]
async fn a_panicking_tool_does_not_abort_the_parallel_batch() {
    let executor = ToolExecutor::new(&config(4));
    let mut registry = ToolRegistry::new();
    registry.register(panicking_tool("volatile"));
    registry.register(echo_tool());

    let calls = vec![
        echo_call("c1", "alpha"),
        ToolCall::new("c2", "volatile", "{}"),
        echo_call("c3", "omega"),
    ];
    let outcomes = executor.execute_all(&calls, &registry).await;

    assert_eq!(outcomes[0].output(), Some("alpha"));
    assert_eq!(outcomes[1].failure_kind(), Some(FailureKind::ExecutionError));
    assert!(outcomes[1].message().unwrap().contains("panicked"));
    assert_eq!(outcomes[2].output(), Some("omega"));
}

#[tokio::test]
async fn malformed_arguments_fail_without_aborting_the_batch() {
    let executor = ToolExecutor::new(&config(1));
    let mut registry = ToolRegistry::new();
    registry.register(echo_tool());

    let calls = vec![
        ToolCall::new("c1", "echo", "{this is not json"),
        echo_call("c2", "still fine"),
    ];
    let outcomes = executor.execute_all(&calls, &registry).await;

    assert_eq!(outcomes[0].failure_kind(), Some(FailureKind::ExecutionError));
    assert_eq!(outcomes[1].output(), Some("still fine"));
}

#[tokio::test]
async fn non_object_arguments_are_rejected() {
    let executor = ToolExecutor::new(&config(1));
    let mut registry = ToolRegistry::new();
    registry.register(weather_tool());

    let calls = vec![ToolCall::new("c1", "get_weather", "[1,2,3]")];
    let outcomes = executor.execute_all(&calls, &registry).await;

    assert_eq!(outcomes[0].failure_kind(), Some(FailureKind::ExecutionError));
}

#[tokio::test]
async fn blank_arguments_decode_to_no_arguments() {
    let executor = ToolExecutor::new(&config(1));
    let counter = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    registry.register(counting_tool("tick", Arc::clone(&counter)));

    let calls = vec![ToolCall::new("c1", "tick", "")];
    let outcomes = executor.execute_all(&calls, &registry).await;

    assert!(outcomes[0].is_success());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn long_output_is_truncated_with_marker() {
    let config = AgentConfig::builder()
        .model("test-model")
        .max_concurrent_tools(1)
        .max_tool_response_length(10)
        .build();
    let executor = ToolExecutor::new(&config);
    let mut registry = ToolRegistry::new();
    registry.register(verbose_tool("spam", 100));

    let calls = vec![ToolCall::new("c1", "spam", "{}")];
    let outcomes = executor.execute_all(&calls, &registry).await;

    let output = outcomes[0].output().unwrap();
    assert!(output.ends_with(TRUNCATION_MARKER));
    assert_eq!(output.len(), 10 + TRUNCATION_MARKER.len());
}

#[tokio::test]
async fn invocation_counter_counts_every_attempt() {
    let config = AgentConfig::builder()
        .model("test-model")
        .max_concurrent_tools(4)
        .tool_timeout(Duration::from_millis(100))
        .tool_start_jitter_max(Duration::ZERO)
        .build();
    let executor = ToolExecutor::new(&config);
    let mut registry = ToolRegistry::new();
    registry.register(echo_tool());
    registry.register(sleeping_tool("slow", Duration::from_secs(30)));

    let calls = vec![
        echo_call("c1", "ok"),
        ToolCall::new("c2", "ghost", "{}"),
        ToolCall::new("c3", "slow", "{}"),
    ];
    let outcomes = executor.execute_all(&calls, &registry).await;

    // Success, not-found, and timeout all count.
    assert_eq!(outcomes.len(), 3);
    assert_eq!(executor.total_tool_calls(), 3);

    executor.reset_tool_call_count();
    assert_eq!(executor.total_tool_calls(), 0);
}
