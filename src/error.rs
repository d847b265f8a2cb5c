use crate::llm::LlmError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("a request is already in flight")]
    Busy,

    #[error("message is empty")]
    EmptyMessage,

    #[error("API key not configured")]
    MissingCredential,

    #[error("failed to read settings: {0}")]
    Settings(#[from] rusqlite::Error),
}
