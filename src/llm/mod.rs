pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub delta: String,
    pub done: bool,
}

/// Narrow contract to a chat-completions endpoint.
///
/// `send` hands back the provider's JSON body untouched; turning it into an
/// assistant message is [`crate::context::extract_reply`]'s job.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, messages: &[ChatMessage]) -> Result<serde_json::Value, LlmError>;

    /// Streams the reply through `on_chunk` and returns the concatenated text.
    async fn send_stream(
        &self,
        messages: &[ChatMessage],
        on_chunk: &(dyn Fn(StreamChunk) + Send + Sync),
    ) -> Result<String, LlmError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}
