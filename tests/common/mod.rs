//! Shared test helpers: a scripted mock backend and canned tools.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use tycho::{
    ChatClient, ChatRequest, ChatResponse, ClosureTool, FunctionSchema, Result, Tool, ToolCall,
    TychoError, Usage,
};

fn mock_usage() -> Usage {
    Usage {
        prompt_tokens: 10,
        completion_tokens: 20,
        total_tokens: 30,
    }
}

/// A scripted backend: responses are consumed front to back, one per call,
/// and every request is captured for inspection. An empty script yields a
/// plain "Mock response".
pub struct MockChatClient {
    script: Mutex<Vec<Result<ChatResponse>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a plain text response.
    pub fn queue_text(&self, text: &str) {
        self.script.lock().unwrap().push(Ok(ChatResponse {
            content: Some(text.to_string()),
            tool_calls: None,
            usage: mock_usage(),
        }));
    }

    /// Queue a response requesting a single tool call.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) {
        self.queue_tool_calls(vec![ToolCall::new(id, name, args.to_string())]);
    }

    /// Queue a response requesting several tool calls at once.
    pub fn queue_tool_calls(&self, calls: Vec<ToolCall>) {
        self.script.lock().unwrap().push(Ok(ChatResponse {
            content: None,
            tool_calls: Some(calls),
            usage: mock_usage(),
        }));
    }

    /// Queue a response carrying both text and tool calls.
    pub fn queue_text_with_tool_calls(&self, text: &str, calls: Vec<ToolCall>) {
        self.script.lock().unwrap().push(Ok(ChatResponse {
            content: Some(text.to_string()),
            tool_calls: Some(calls),
            usage: mock_usage(),
        }));
    }

    /// Queue a response with neither content nor tool calls.
    pub fn queue_empty(&self) {
        self.script.lock().unwrap().push(Ok(ChatResponse {
            content: None,
            tool_calls: None,
            usage: mock_usage(),
        }));
    }

    /// Queue a failed call.
    pub fn queue_error(&self, error: TychoError) {
        self.script.lock().unwrap().push(Err(error));
    }

    /// Number of chat calls made so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The request captured for call number `index` (0-based).
    pub fn request(&self, index: usize) -> ChatRequest {
        self.requests.lock().unwrap()[index].clone()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            return Ok(ChatResponse {
                content: Some("Mock response".to_string()),
                tool_calls: None,
                usage: mock_usage(),
            });
        }
        script.remove(0)
    }
}

/// Canned weather lookup: returns a fixed report for the requested city.
pub fn weather_tool() -> Arc<dyn Tool> {
    Arc::new(ClosureTool::new(
        FunctionSchema::builder("get_weather", "Look up the current weather for a city")
            .string("city", "City name", true)
            .build(),
        |args| async move {
            let city = args.get_str("city")?.to_string();
            Ok(format!("Sunny in {city}, 21C"))
        },
    ))
}

/// Echoes back the `text` argument.
pub fn echo_tool() -> Arc<dyn Tool> {
    Arc::new(ClosureTool::new(
        FunctionSchema::builder("echo", "Echo the given text back")
            .string("text", "Text to echo", true)
            .build(),
        |args| async move {
            let text = args.get_str("text")?.to_string();
            Ok(text)
        },
    ))
}

/// Counts invocations and reports the running total.
pub fn counting_tool(name: &str, counter: Arc<AtomicUsize>) -> Arc<dyn Tool> {
    Arc::new(ClosureTool::new(
        FunctionSchema::new(name, "Count how many times this tool ran"),
        move |_args| {
            let counter = Arc::clone(&counter);
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(format!("count={count}"))
            }
        },
    ))
}

/// Sleeps for the given duration before answering.
pub fn sleeping_tool(name: &str, duration: Duration) -> Arc<dyn Tool> {
    Arc::new(ClosureTool::new(
        FunctionSchema::new(name, "Sleep, then answer"),
        move |_args| async move {
            tokio::time::sleep(duration).await;
            Ok("woke up".to_string())
        },
    ))
}

/// Always fails with a tool execution error.
pub fn failing_tool(name: &str) -> Arc<dyn Tool> {
    let tool_name = name.to_string();
    Arc::new(ClosureTool::new(
        FunctionSchema::new(name, "Always fails"),
        move |_args| {
            let tool_name = tool_name.clone();
            async move {
                Err(TychoError::ToolExecution {
                    tool_name,
                    message: "boom".to_string(),
                })
            }
        },
    ))
}

/// Returns a payload of the requested number of `x` characters.
pub fn verbose_tool(name: &str, chars: usize) -> Arc<dyn Tool> {
    Arc::new(ClosureTool::new(
        FunctionSchema::new(name, "Produce a large output"),
        move |_args| async move { Ok("x".repeat(chars)) },
    ))
}
