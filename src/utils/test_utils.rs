use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::api::ChatMessage;
use crate::core::app::{App, AppInitConfig};
use crate::core::backend::{
    BackendError, GenerationBackend, GenerationChunk, GenerationStream, ModelLister, Retriever,
};
use crate::core::preprompt::PrepromptStore;
use crate::core::render::{DisplayEvent, RenderSink};

pub const TEST_MODEL: &str = "gemma3:4b";

pub fn create_test_app() -> App {
    create_test_app_with_preprompt(
        std::env::temp_dir()
            .join("l4m-test-missing")
            .join("preprompt.txt"),
    )
}

pub fn create_test_app_with_preprompt(path: PathBuf) -> App {
    App::new(AppInitConfig {
        model: TEST_MODEL.to_string(),
        rag_enabled: false,
        retrieval_k: 5,
        preprompt: PrepromptStore::new(path),
        log_file: None,
    })
}

pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

pub fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

/// Sink for tests that only assert on controller state.
pub struct NullSink;

impl RenderSink for NullSink {
    fn emit(&mut self, _event: DisplayEvent) {}
}

/// Sink that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<DisplayEvent>,
}

impl RecordingSink {
    /// Assistant text after each streamed chunk, in order.
    pub fn assistant_updates(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                DisplayEvent::AssistantUpdated { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn spinner_frames(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, DisplayEvent::SpinnerFrame { .. }))
            .count()
    }
}

impl RenderSink for RecordingSink {
    fn emit(&mut self, event: DisplayEvent) {
        self.events.push(event);
    }
}

/// Backend that replays a fixed script for every request.
pub struct ScriptedBackend {
    script: Vec<Result<GenerationChunk, BackendError>>,
    requests: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<GenerationChunk, BackendError>>) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl GenerationBackend for ScriptedBackend {
    fn generate(&self, model: &str, history: Vec<ChatMessage>) -> GenerationStream {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), history));
        stream::iter(self.script.clone()).boxed()
    }
}

pub struct StaticRetriever {
    passages: Result<Vec<String>, BackendError>,
}

impl StaticRetriever {
    pub fn new(passages: Vec<&str>) -> Self {
        Self {
            passages: Ok(passages.into_iter().map(str::to_string).collect()),
        }
    }

    pub fn failing(error: BackendError) -> Self {
        Self {
            passages: Err(error),
        }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, _query: &str, k: usize) -> Result<Vec<String>, BackendError> {
        let passages = self.passages.clone()?;
        Ok(passages.into_iter().take(k).collect())
    }
}

pub struct StaticModelLister {
    result: Result<Vec<String>, BackendError>,
}

impl StaticModelLister {
    pub fn new(result: Result<Vec<&str>, BackendError>) -> Self {
        Self {
            result: result.map(|models| models.into_iter().map(str::to_string).collect()),
        }
    }
}

#[async_trait]
impl ModelLister for StaticModelLister {
    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        self.result.clone()
    }
}
