use super::{ChatMessage, ChatTransport, LlmError, StreamChunk};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-pro";
pub const APP_TITLE: &str = "PDF Chat Assistant";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Sent as `X-Title` for OpenRouter app attribution.
    pub title: Option<String>,
}

impl OpenAiConfig {
    pub fn openrouter(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            title: Some(APP_TITLE.to_string()),
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAiStreamResponse {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    /// OpenRouter puts the HTTP status here for errors raised mid-stream.
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// HTTP transport for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn post(
        &self,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let body = OpenAiRequest {
            model: &self.config.model,
            messages,
            stream,
        };

        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Content-Type", "application/json")
            .json(&body);

        if !self.config.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.config.api_key));
        }
        if let Some(title) = &self.config.title {
            req = req.header("X-Title", title);
        }

        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            stream,
            "posting chat completion"
        );
        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            let message = api_error_message(&text);
            tracing::warn!(status, %message, "provider rejected request");
            return Err(LlmError::Api { status, message });
        }

        Ok(resp)
    }
}

#[async_trait]
impl ChatTransport for OpenAiClient {
    async fn send(&self, messages: &[ChatMessage]) -> Result<serde_json::Value, LlmError> {
        let resp = self.post(messages, false).await?;
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| LlmError::Parse(e.to_string()))
    }

    async fn send_stream(
        &self,
        messages: &[ChatMessage],
        on_chunk: &(dyn Fn(StreamChunk) + Send + Sync),
    ) -> Result<String, LlmError> {
        let resp = self.post(messages, true).await?;

        let mut full_content = String::new();
        let mut stream = resp.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);

            // Split on raw bytes so a multi-byte char cut across chunks survives.
            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line);

                let Some(event) = parse_sse_line(line.trim())? else {
                    continue;
                };
                if let Some(delta) = event.delta {
                    full_content.push_str(&delta);
                    on_chunk(StreamChunk { delta, done: false });
                }
                if event.done {
                    on_chunk(StreamChunk {
                        delta: String::new(),
                        done: true,
                    });
                    return Ok(full_content);
                }
            }
        }

        tracing::warn!(received = full_content.len(), "stream closed before completion");
        Err(LlmError::Parse("stream ended early".to_string()))
    }
}

/// Provider-reported `error.message`, falling back to the raw body.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<OpenAiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "Failed to get response".to_string(),
        Err(_) => body.to_string(),
    }
}

#[derive(Debug, PartialEq)]
struct SseEvent {
    delta: Option<String>,
    done: bool,
}

/// One SSE line. Comments, blank lines and unknown payloads yield `None`;
/// an `error` payload becomes `LlmError::Api`.
fn parse_sse_line(line: &str) -> Result<Option<SseEvent>, LlmError> {
    let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
        return Ok(None);
    };
    if data == "[DONE]" {
        return Ok(Some(SseEvent {
            delta: None,
            done: true,
        }));
    }

    if let Ok(parsed) = serde_json::from_str::<OpenAiErrorBody>(data) {
        let status = parsed
            .error
            .code
            .as_ref()
            .and_then(serde_json::Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(200);
        tracing::warn!(status, message = %parsed.error.message, "provider error in stream");
        return Err(LlmError::Api {
            status,
            message: parsed.error.message,
        });
    }

    let Ok(parsed) = serde_json::from_str::<OpenAiStreamResponse>(data) else {
        return Ok(None);
    };
    Ok(parsed.choices.into_iter().next().map(|choice| SseEvent {
        delta: choice.delta.content.filter(|c| !c.is_empty()),
        done: choice.finish_reason.is_some(),
    }))
}
