//! OpenAI-compatible Chat Completions client.

use std::sync::OnceLock;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, TychoError};
use crate::types::{ChatMessage, Role, ToolCall, Usage};

use super::{ChatClient, ChatRequest, ChatResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Build default headers for a Bearer-token API.
fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Map a non-200 HTTP status to the matching error variant.
fn status_to_error(status: u16, body: &str) -> TychoError {
    match status {
        401 | 403 => TychoError::Authentication(body.to_string()),
        429 => TychoError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => TychoError::api(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChatClient {
    api_key: String,
    base_url: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different OpenAI-compatible endpoint (no trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build a client from `OPENAI_API_KEY` (and optionally
    /// `OPENAI_BASE_URL`), loading a `.env` file if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            TychoError::Configuration("OPENAI_API_KEY is not set".to_string())
        })?;
        let mut client = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            client.base_url = base_url;
        }
        Ok(client)
    }

    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_wire)
            .collect::<Vec<_>>();

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
        });

        let obj = body.as_object_mut().unwrap();

        if let Some(temp) = request.temperature {
            obj.insert("temperature".into(), temp.into());
        }

        if !request.tools.is_empty() {
            let tool_defs: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            obj.insert("tools".into(), tool_defs.into());

            if let Some(choice) = request.tool_choice {
                obj.insert("tool_choice".into(), choice.as_str().into());
            }
        }

        body
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, messages = request.messages.len(), "chat completion request");

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: WireResponse = resp.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TychoError::api(200, "no choices in chat completion response"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .filter(|calls| !calls.is_empty())
            .map(|calls| {
                calls
                    .into_iter()
                    .map(|tc| ToolCall::new(tc.id, tc.function.name, tc.function.arguments))
                    .collect()
            });

        Ok(ChatResponse {
            content: choice.message.content,
            tool_calls,
            usage: data
                .usage
                .map(|u| Usage {
                    prompt_tokens: u.prompt_tokens,
                    completion_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
        })
    }
}

fn message_to_wire(msg: &ChatMessage) -> serde_json::Value {
    if let Some(calls) = &msg.tool_calls {
        let wire_calls: Vec<serde_json::Value> = calls
            .iter()
            .map(|tc| {
                serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": {
                        "name": tc.name,
                        "arguments": tc.arguments,
                    }
                })
            })
            .collect();
        return serde_json::json!({
            "role": msg.role,
            "content": msg.content,
            "tool_calls": wire_calls,
        });
    }

    if msg.role == Role::Tool {
        let mut wire = serde_json::json!({
            "role": msg.role,
            "tool_call_id": msg.tool_call_id,
            "content": msg.content.as_deref().unwrap_or_default(),
        });
        if let Some(name) = &msg.name {
            wire.as_object_mut().unwrap().insert("name".into(), name.as_str().into());
        }
        return wire;
    }

    serde_json::json!({
        "role": msg.role,
        "content": msg.content.as_deref().unwrap_or_default(),
    })
}

// Wire-format response types (internal)

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}
