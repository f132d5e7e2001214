//! Generation workers.
//!
//! Each submission runs on its own Tokio task. The task never touches UI
//! state: it reports through a bounded channel tagged with its stream id, and
//! the event loop drains that channel on every tick.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::ChatMessage;
use crate::core::backend::{BackendError, GenerationBackend, Retriever};
use crate::core::retrieval::build_rag_prompt;

/// Capacity of the worker-to-UI channel. Workers wait when it is full.
pub const STREAM_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    /// Retrieved context was folded into the prompt sent for this stream.
    Retrieved(String),
    Chunk(String),
    Error(BackendError),
    End,
}

/// Query to augment with retrieved passages before generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalRequest {
    pub query: String,
    pub k: usize,
}

pub struct StreamParams {
    pub model: String,
    pub history: Vec<ChatMessage>,
    pub retrieval: Option<RetrievalRequest>,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

pub type StreamReceiver = mpsc::Receiver<(StreamMessage, u64)>;

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::Sender<(StreamMessage, u64)>,
    backend: Arc<dyn GenerationBackend>,
    retriever: Arc<dyn Retriever>,
}

impl ChatStreamService {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        retriever: Arc<dyn Retriever>,
    ) -> (Self, StreamReceiver) {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        (
            Self {
                tx,
                backend,
                retriever,
            },
            rx,
        )
    }

    pub fn spawn_stream(&self, params: StreamParams) -> JoinHandle<()> {
        let tx = self.tx.clone();
        let backend = Arc::clone(&self.backend);
        let retriever = Arc::clone(&self.retriever);

        tokio::spawn(async move {
            let cancel_token = params.cancel_token.clone();
            let stream_id = params.stream_id;
            tokio::select! {
                _ = run_stream(tx, backend, retriever, params) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "stream worker cancelled");
                }
            }
        })
    }
}

async fn send(tx: &mpsc::Sender<(StreamMessage, u64)>, message: StreamMessage, id: u64) -> bool {
    tx.send((message, id)).await.is_ok()
}

async fn run_stream(
    tx: mpsc::Sender<(StreamMessage, u64)>,
    backend: Arc<dyn GenerationBackend>,
    retriever: Arc<dyn Retriever>,
    params: StreamParams,
) {
    let StreamParams {
        model,
        mut history,
        retrieval,
        cancel_token,
        stream_id,
    } = params;

    if let Some(RetrievalRequest { query, k }) = retrieval {
        match retriever.retrieve(&query, k).await {
            Ok(passages) => {
                debug!(stream_id, passages = passages.len(), "retrieved context");
                let prompt = build_rag_prompt(&passages, &query);
                if let Some(entry) = history.iter_mut().rev().find(|m| m.role == "user") {
                    entry.content = prompt.clone();
                }
                if !send(&tx, StreamMessage::Retrieved(prompt), stream_id).await {
                    return;
                }
            }
            Err(err) => {
                send(&tx, StreamMessage::Error(err), stream_id).await;
                return;
            }
        }
    }

    let mut stream = backend.generate(&model, history);
    while let Some(item) = stream.next().await {
        if cancel_token.is_cancelled() {
            return;
        }

        match item {
            Ok(chunk) => {
                if !chunk.text.is_empty()
                    && !send(&tx, StreamMessage::Chunk(chunk.text), stream_id).await
                {
                    return;
                }
                if chunk.done {
                    send(&tx, StreamMessage::End, stream_id).await;
                    return;
                }
            }
            Err(err) => {
                debug!(stream_id, error = %err, "stream failed");
                send(&tx, StreamMessage::Error(err), stream_id).await;
                return;
            }
        }
    }

    send(&tx, StreamMessage::Error(BackendError::Interrupted), stream_id).await;
}

#[cfg(test)]
impl ChatStreamService {
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.try_send((message, stream_id));
    }
}
