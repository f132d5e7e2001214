//! HTTP client for a local Ollama server.

use async_trait::async_trait;
use futures_util::stream::{self, Stream, StreamExt};
use memchr::memchr;
use tracing::debug;

use crate::api::models::fetch_models;
use crate::api::{ChatMessage, ChatRequest, ChatResponseChunk, EmbedRequest, EmbedResponse};
use crate::core::backend::{
    BackendError, GenerationBackend, GenerationChunk, GenerationStream, ModelLister,
};
use crate::utils::url::construct_api_url;

#[derive(Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, BackendError> {
        let url = construct_api_url(&self.base_url, "api/embed");
        let response = self
            .client
            .post(url)
            .json(&EmbedRequest { model, input: text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::from_status(status, &body));
        }

        let payload = response.json::<EmbedResponse>().await?;
        payload
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Protocol("embedding response was empty".to_string()))
    }
}

impl GenerationBackend for OllamaClient {
    fn generate(&self, model: &str, history: Vec<ChatMessage>) -> GenerationStream {
        let client = self.client.clone();
        let chat_url = construct_api_url(&self.base_url, "api/chat");
        let request = ChatRequest {
            model: model.to_string(),
            messages: history,
            stream: true,
        };

        let response = async move {
            debug!(url = %chat_url, model = %request.model, "starting chat stream");
            let response = client.post(chat_url).json(&request).send().await?;
            if !response.status().is_success() {
                let status = response.status().as_u16();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<no body>".to_string());
                return Err(BackendError::from_status(status, &error_text));
            }
            Ok(response.bytes_stream())
        };

        stream::once(response)
            .flat_map(|result| match result {
                Ok(bytes) => decode_chat_stream(bytes).boxed(),
                Err(err) => stream::iter([Err(err)]).boxed(),
            })
            .boxed()
    }
}

#[async_trait]
impl ModelLister for OllamaClient {
    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let response = fetch_models(&self.client, &self.base_url).await?;
        Ok(response
            .models
            .iter()
            .map(|model| model.id().to_string())
            .collect())
    }
}

/// Splits a byte stream into newline-delimited JSON objects.
#[derive(Default)]
struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<Result<GenerationChunk, BackendError>> {
        self.buffer.extend_from_slice(bytes);

        let mut decoded = Vec::new();
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if let Some(item) = parse_chat_line(&line[..newline_pos]) {
                decoded.push(item);
            }
        }
        decoded
    }

    /// Parses whatever is left once the byte stream ends.
    fn finish(&mut self) -> Vec<Result<GenerationChunk, BackendError>> {
        let rest = std::mem::take(&mut self.buffer);
        parse_chat_line(&rest).into_iter().collect()
    }
}

fn decode_chat_stream<S, B>(bytes: S) -> impl Stream<Item = Result<GenerationChunk, BackendError>>
where
    S: Stream<Item = Result<B, reqwest::Error>>,
    B: AsRef<[u8]>,
{
    let mut decoder = LineDecoder::default();
    bytes
        .map(Some)
        .chain(stream::once(async { None }))
        .map(move |read| match read {
            Some(Ok(chunk_bytes)) => decoder.push(chunk_bytes.as_ref()),
            Some(Err(err)) => vec![Err(BackendError::from(err))],
            None => decoder.finish(),
        })
        .flat_map(stream::iter)
}

fn parse_chat_line(line: &[u8]) -> Option<Result<GenerationChunk, BackendError>> {
    let line = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(err) => {
            return Some(Err(BackendError::Protocol(format!(
                "invalid UTF-8 in stream: {err}"
            ))))
        }
    };

    if line.is_empty() {
        return None;
    }

    let parsed = match serde_json::from_str::<ChatResponseChunk>(line) {
        Ok(chunk) => chunk,
        Err(err) => return Some(Err(BackendError::Protocol(err.to_string()))),
    };

    if let Some(error) = parsed.error {
        return Some(Err(BackendError::Backend(error)));
    }

    Some(Ok(GenerationChunk {
        text: parsed.message.map(|m| m.content).unwrap_or_default(),
        done: parsed.done,
    }))
}
