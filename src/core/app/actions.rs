use tokio::sync::mpsc;

use super::App;
use crate::core::backend::BackendError;
use crate::core::chat_stream::StreamParams;
use crate::core::render::RenderSink;

/// Results of background work that the UI task applies to [`App`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    ModelsLoaded { models: Vec<String> },
    ModelsLoadFailed { error: BackendError },
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppAction>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppAction>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: AppAction) {
        let _ = self.tx.send(action);
    }
}

/// I/O the controller asks the event loop to perform.
pub enum AppCommand {
    SpawnStream(StreamParams),
    LoadModels,
}

pub fn apply_actions(
    app: &mut App,
    actions: impl IntoIterator<Item = AppAction>,
    sink: &mut dyn RenderSink,
) {
    for action in actions {
        apply_action(app, action, sink);
    }
}

pub fn apply_action(app: &mut App, action: AppAction, sink: &mut dyn RenderSink) {
    match action {
        AppAction::ModelsLoaded { models } => app.apply_models_loaded(models, sink),
        AppAction::ModelsLoadFailed { error } => app.apply_models_failed(error, sink),
    }
}
