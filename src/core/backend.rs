//! Seams to the generation, model-listing and retrieval services.
//!
//! Everything behind these traits performs I/O and runs on worker tasks. The
//! controller only ever sees their results as [`BackendError`] values or
//! stream messages.

use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::api::ChatMessage;

/// One incremental unit of generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationChunk {
    pub text: String,
    pub done: bool,
}

impl GenerationChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }

    pub fn done() -> Self {
        Self {
            text: String::new(),
            done: true,
        }
    }
}

pub type GenerationStream = BoxStream<'static, Result<GenerationChunk, BackendError>>;

pub trait GenerationBackend: Send + Sync {
    /// Starts generation for `model` over the ordered conversation history.
    ///
    /// The returned stream yields chunks until one carries `done = true`.
    fn generate(&self, model: &str, history: Vec<ChatMessage>) -> GenerationStream;
}

#[async_trait]
pub trait ModelLister: Send + Sync {
    async fn list_models(&self) -> Result<Vec<String>, BackendError>;
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns up to `k` passages related to `query`, best match first.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, BackendError>;
}

/// Errors that can occur while talking to the model or retrieval services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The service could not be reached.
    Unavailable(String),

    /// The service answered with a non-success HTTP status.
    Status {
        /// HTTP status code.
        status: u16,
        /// Short summary of the response body.
        message: String,
    },

    /// The service reported an error inside an otherwise valid response.
    Backend(String),

    /// The response could not be decoded.
    Protocol(String),

    /// The stream closed before the backend signalled completion.
    Interrupted,
}

impl BackendError {
    /// Builds a [`BackendError::Status`] from a raw response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        BackendError::Status {
            status,
            message: summarize_error_body(body),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Unavailable(reason) => write!(f, "Backend unavailable: {reason}"),
            BackendError::Status { status, message } => {
                write!(f, "Backend returned HTTP {status}: {message}")
            }
            BackendError::Backend(message) => write!(f, "Backend error: {message}"),
            BackendError::Protocol(reason) => write!(f, "Malformed backend response: {reason}"),
            BackendError::Interrupted => write!(f, "Response stream ended unexpectedly"),
        }
    }
}

impl StdError for BackendError {}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Protocol(err.to_string())
        } else if let Some(status) = err.status() {
            BackendError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            BackendError::Unavailable(err.to_string())
        }
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("error").and_then(|v| v.as_str()))
        .or_else(|| value.get("message").and_then(|v| v.as_str()))?;

    Some(summary.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Collapses an error body to a single line, preferring the JSON `error`
/// field when present.
pub fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&value).filter(|s| !s.is_empty()) {
            return summary;
        }
    }

    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}
