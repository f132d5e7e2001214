//! Wire payloads for the Ollama HTTP API.

pub mod models;
pub mod ollama;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

#[derive(Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: String,
}

/// One newline-delimited object of a streamed `/api/chat` response.
#[derive(Deserialize)]
pub struct ChatResponseChunk {
    #[serde(default)]
    pub message: Option<ChatResponseMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ModelDetails {
    pub parameter_size: Option<String>,
    pub quantization_level: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    pub modified_at: Option<String>,
    pub size: Option<u64>,
    pub details: Option<ModelDetails>,
}

impl ModelInfo {
    /// Identifier accepted by `/api/chat`.
    pub fn id(&self) -> &str {
        self.model.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct ModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Serialize)]
pub struct EmbedRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
}

#[derive(Deserialize)]
pub struct EmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
}
