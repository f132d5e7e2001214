//! The session controller.
//!
//! [`App`] owns every piece of UI-thread state. Keys come in through
//! [`App::handle_key`], worker output through [`App::apply_stream_message`]
//! and [`apply_actions`]. Anything that needs I/O is handed back to the event
//! loop as an [`AppCommand`].

use std::time::Instant;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

use crate::commands::{self, CommandResult};
use crate::core::backend::BackendError;
use crate::core::chat_stream::{RetrievalRequest, StreamMessage};
use crate::core::message::AppMessageKind;
use crate::core::mode::{Intent, Key, Mode};
use crate::core::preprompt::PrepromptStore;
use crate::core::render::{DisplayEvent, RenderSink, StreamOutcome};
use crate::core::session::ChatSession;
use crate::utils::logging::LoggingState;

pub mod actions;
pub mod input;
pub mod overlay;
pub mod preprompt_editor;
pub mod sidebar;
pub mod streaming;

#[cfg(test)]
mod tests;

pub use actions::{apply_action, apply_actions, AppAction, AppActionDispatcher, AppCommand};
pub use input::{InputOutcome, TextInput};
pub use overlay::{Overlay, OverlayKind, SETTING_CHANGE_PREPROMPT};
pub use preprompt_editor::{EditorOutcome, PrepromptEditor};
pub use sidebar::{Sidebar, SidebarItem, SIDEBAR_MODEL, SIDEBAR_RAG, SIDEBAR_SETTINGS};
pub use streaming::{FinishedStream, StreamCoordinator, StreamPhase, SPINNER_FRAMES};

/// Startup parameters for [`App::new`].
pub struct AppInitConfig {
    pub model: String,
    pub rag_enabled: bool,
    pub retrieval_k: usize,
    pub preprompt: PrepromptStore,
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RagSettings {
    pub enabled: bool,
    pub k: usize,
}

pub struct App {
    pub mode: Mode,
    pub session: ChatSession,
    pub sidebar: Sidebar,
    pub overlay: Option<Overlay>,
    pub editor: Option<PrepromptEditor>,
    pub input: TextInput,
    pub stream: StreamCoordinator,
    pub rag: RagSettings,
    pub preprompt: PrepromptStore,
    pub logging: LoggingState,
    pub status: Option<String>,
    exit_requested: bool,
}

impl App {
    pub fn new(config: AppInitConfig) -> Self {
        let AppInitConfig {
            model,
            rag_enabled,
            retrieval_k,
            preprompt,
            log_file,
        } = config;

        let mut startup_errors = Vec::new();
        let preprompt_text = preprompt.load().unwrap_or_else(|err| {
            startup_errors.push(format!(
                "Could not read preprompt {}: {err}",
                preprompt.path().display()
            ));
            None
        });
        let logging = LoggingState::new(log_file).unwrap_or_else(|err| {
            startup_errors.push(format!("Could not open log file: {err}"));
            LoggingState::disabled()
        });

        let mut app = App {
            mode: Mode::default(),
            session: ChatSession::new(model.clone(), preprompt_text),
            sidebar: Sidebar::new(&model, rag_enabled),
            overlay: None,
            editor: None,
            input: TextInput::new(),
            stream: StreamCoordinator::new(),
            rag: RagSettings {
                enabled: rag_enabled,
                k: retrieval_k,
            },
            preprompt,
            logging,
            status: None,
            exit_requested: false,
        };
        for error in startup_errors {
            warn!("{error}");
            app.session.add_app_message(AppMessageKind::Error, error);
        }
        app
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Routes one key press. Ctrl+C quits from anywhere, the preprompt editor
    /// swallows everything else while it is open.
    pub fn handle_key(&mut self, event: KeyEvent, sink: &mut dyn RenderSink) -> Option<AppCommand> {
        if event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL) {
            self.request_exit(sink);
            return None;
        }
        self.status = None;

        if self.editor.is_some() {
            self.handle_editor_key(event, sink);
            return None;
        }

        match self.mode.on_key(Key::from(&event)) {
            Intent::Enter(mode) => {
                self.enter_mode(mode, sink);
                None
            }
            Intent::OpenSidebar => {
                self.sidebar.reset_cursor();
                self.enter_mode(Mode::Sidebar, sink);
                None
            }
            Intent::Submit => {
                let text = self.input.text();
                let command = self.process_submission(&text, sink);
                self.enter_mode(Mode::Typing, sink);
                command
            }
            Intent::Quit => {
                self.request_exit(sink);
                None
            }
            Intent::MoveSidebar(delta) => {
                self.sidebar.move_cursor(delta);
                None
            }
            Intent::ActivateSidebarItem => self.activate_sidebar_item(sink),
            Intent::LeaveSidebar(mode) => {
                self.sidebar.reset_cursor();
                self.enter_mode(mode, sink);
                None
            }
            Intent::MoveOverlay(delta) => {
                if let Some(overlay) = self.overlay.as_mut() {
                    overlay.list.move_cursor(delta);
                    sink.emit(DisplayEvent::OverlayChanged);
                }
                None
            }
            Intent::ApplyOverlay => {
                self.apply_overlay(sink);
                None
            }
            Intent::DismissOverlay => {
                self.close_overlay(sink);
                None
            }
            Intent::ForwardToInput => match self.input.handle_key(event) {
                InputOutcome::Submitted(text) => self.process_submission(&text, sink),
                InputOutcome::Edited | InputOutcome::Ignored => None,
            },
            Intent::Ignore => None,
        }
    }

    fn enter_mode(&mut self, mode: Mode, sink: &mut dyn RenderSink) {
        if self.mode == mode {
            return;
        }
        debug!(from = self.mode.label(), to = mode.label(), "mode change");
        self.mode = mode;
        self.input.set_focused(mode == Mode::Typing);
        self.sidebar.set_mode(mode);
        sink.emit(DisplayEvent::ModeChanged { mode });
    }

    pub fn request_exit(&mut self, sink: &mut dyn RenderSink) {
        self.exit_requested = true;
        self.cancel_stream(sink);
    }

    pub fn cancel_stream(&mut self, sink: &mut dyn RenderSink) {
        if let Some(finished) = self.stream.cancel(&mut self.session, sink) {
            self.log_finished(&finished);
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>, sink: &mut dyn RenderSink) {
        let message = message.into();
        self.status = Some(message.clone());
        sink.emit(DisplayEvent::Status { message });
    }

    pub fn add_notice(
        &mut self,
        kind: AppMessageKind,
        content: impl Into<String>,
        sink: &mut dyn RenderSink,
    ) {
        let index = self.session.add_app_message(kind, content);
        sink.emit(DisplayEvent::MessageAppended { index });
    }

    /// Runs slash commands, otherwise submits the text as a prompt.
    pub fn process_submission(&mut self, text: &str, sink: &mut dyn RenderSink) -> Option<AppCommand> {
        match commands::process_input(self, text, sink) {
            CommandResult::Continue => {
                self.input.clear();
                None
            }
            CommandResult::ProcessAsMessage(message) => self.submit_text(&message, false, sink),
            CommandResult::ProcessWithRetrieval(query) => self.submit_text(&query, true, sink),
        }
    }

    fn submit_text(
        &mut self,
        text: &str,
        force_retrieval: bool,
        sink: &mut dyn RenderSink,
    ) -> Option<AppCommand> {
        if text.trim().is_empty() {
            return None;
        }
        if self.stream.is_busy() {
            self.set_status("Still waiting for the current response", sink);
            return None;
        }

        let submission = self.session.submit(text)?;
        self.input.clear();
        sink.emit(DisplayEvent::MessageAppended {
            index: submission.assistant_index - 1,
        });
        sink.emit(DisplayEvent::MessageAppended {
            index: submission.assistant_index,
        });
        self.log_transcript(&format!("You: {}", submission.prompt));

        let retrieval = (force_retrieval || self.rag.enabled).then(|| RetrievalRequest {
            query: submission.prompt.clone(),
            k: self.rag.k,
        });
        self.stream
            .begin(&submission, retrieval, Instant::now(), sink)
            .map(AppCommand::SpawnStream)
    }

    pub fn apply_stream_message(
        &mut self,
        message: StreamMessage,
        stream_id: u64,
        sink: &mut dyn RenderSink,
    ) {
        if let Some(finished) = self
            .stream
            .apply_message(message, stream_id, &mut self.session, sink)
        {
            self.log_finished(&finished);
        }
    }

    /// Advances time-driven state. Returns whether anything changed.
    pub fn tick(&mut self, now: Instant, sink: &mut dyn RenderSink) -> bool {
        self.stream.tick(now, sink)
    }

    fn log_finished(&mut self, finished: &FinishedStream) {
        if finished.text.is_empty() {
            return;
        }
        let entry = match finished.outcome {
            StreamOutcome::Committed => finished.text.clone(),
            StreamOutcome::Failed | StreamOutcome::Cancelled => {
                format!("{} [incomplete]", finished.text)
            }
        };
        self.log_transcript(&entry);
    }

    fn log_transcript(&self, entry: &str) {
        if let Err(err) = self.logging.log_message(entry) {
            warn!(error = %err, "failed to write transcript log");
        }
    }

    fn activate_sidebar_item(&mut self, sink: &mut dyn RenderSink) -> Option<AppCommand> {
        match self.sidebar.selected_key()? {
            SIDEBAR_MODEL => {
                self.open_overlay(Overlay::model_picker(self.mode), sink);
                Some(AppCommand::LoadModels)
            }
            SIDEBAR_RAG => {
                self.set_rag_enabled(!self.rag.enabled, sink);
                None
            }
            SIDEBAR_SETTINGS => {
                self.open_overlay(Overlay::settings(self.mode), sink);
                None
            }
            _ => None,
        }
    }

    pub fn set_rag_enabled(&mut self, enabled: bool, sink: &mut dyn RenderSink) {
        self.rag.enabled = enabled;
        self.sidebar.set_label(SIDEBAR_RAG, sidebar::rag_label(enabled));
        let state = if enabled { "enabled" } else { "disabled" };
        self.set_status(format!("Retrieval {state}"), sink);
    }

    fn open_overlay(&mut self, overlay: Overlay, sink: &mut dyn RenderSink) {
        let mode = overlay.kind.mode();
        self.overlay = Some(overlay);
        self.enter_mode(mode, sink);
        sink.emit(DisplayEvent::OverlayChanged);
    }

    /// Dismisses the open overlay, restoring the mode it was opened from.
    pub fn close_overlay(&mut self, sink: &mut dyn RenderSink) {
        let Some(overlay) = self.overlay.take() else {
            return;
        };
        self.enter_mode(overlay.return_mode, sink);
        sink.emit(DisplayEvent::OverlayChanged);
    }

    fn apply_overlay(&mut self, sink: &mut dyn RenderSink) {
        let Some(overlay) = self.overlay.as_ref() else {
            return;
        };
        let Some(selection) = overlay.selected().map(str::to_string) else {
            return;
        };
        let kind = overlay.kind;

        self.overlay = None;
        self.enter_mode(Mode::Sidebar, sink);
        sink.emit(DisplayEvent::OverlayChanged);

        match kind {
            OverlayKind::ModelPicker => self.select_model(&selection, sink),
            OverlayKind::Settings => self.activate_setting(&selection, sink),
        }
    }

    pub fn select_model(&mut self, model: &str, sink: &mut dyn RenderSink) {
        info!(model, "model selected");
        self.session.set_model(model);
        self.sidebar.set_label(SIDEBAR_MODEL, model);
        self.set_status(format!("Model set to {model}"), sink);
    }

    fn activate_setting(&mut self, setting: &str, sink: &mut dyn RenderSink) {
        if setting == SETTING_CHANGE_PREPROMPT {
            self.open_preprompt_editor(sink);
        }
    }

    fn open_preprompt_editor(&mut self, sink: &mut dyn RenderSink) {
        match self.preprompt.load() {
            Ok(text) => {
                self.editor = Some(PrepromptEditor::new(
                    text.as_deref().unwrap_or_default(),
                    self.mode,
                ));
                self.input.set_focused(false);
                sink.emit(DisplayEvent::OverlayChanged);
            }
            Err(err) => self.add_notice(
                AppMessageKind::Error,
                format!("Could not read preprompt: {err}"),
                sink,
            ),
        }
    }

    fn handle_editor_key(&mut self, event: KeyEvent, sink: &mut dyn RenderSink) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        match editor.handle_key(event) {
            EditorOutcome::Editing => sink.emit(DisplayEvent::OverlayChanged),
            EditorOutcome::Cancel => self.close_editor(sink),
            EditorOutcome::Save(text) => {
                match self.preprompt.save(&text) {
                    Ok(()) => {
                        info!(path = %self.preprompt.path().display(), "preprompt saved");
                        self.session.set_preprompt(Some(text));
                        self.set_status("Preprompt saved", sink);
                    }
                    Err(err) => self.add_notice(
                        AppMessageKind::Error,
                        format!("Could not save preprompt: {err}"),
                        sink,
                    ),
                }
                self.close_editor(sink);
            }
        }
    }

    /// Inserts pasted text into whichever editor owns the keyboard. Pastes
    /// outside typing mode are dropped.
    pub fn handle_paste(&mut self, text: &str, sink: &mut dyn RenderSink) -> bool {
        if text.is_empty() {
            return false;
        }
        if let Some(editor) = self.editor.as_mut() {
            editor.insert_text(text);
            sink.emit(DisplayEvent::OverlayChanged);
            return true;
        }
        if self.mode == Mode::Typing && self.input.insert_text(text) {
            return true;
        }
        false
    }

    fn close_editor(&mut self, sink: &mut dyn RenderSink) {
        if let Some(editor) = self.editor.take() {
            let mode = editor.return_mode();
            self.input.set_focused(mode == Mode::Typing);
            self.enter_mode(mode, sink);
            sink.emit(DisplayEvent::OverlayChanged);
        }
    }

    pub fn apply_models_loaded(&mut self, models: Vec<String>, sink: &mut dyn RenderSink) {
        let current = self.session.model().to_string();
        match self.overlay.as_mut() {
            Some(overlay) if overlay.kind == OverlayKind::ModelPicker && overlay.loading => {
                debug!(count = models.len(), "model list loaded");
                overlay.load_items(models, Some(&current));
                sink.emit(DisplayEvent::OverlayChanged);
            }
            _ => debug!("model list arrived after the picker closed"),
        }
    }

    pub fn apply_models_failed(&mut self, error: BackendError, sink: &mut dyn RenderSink) {
        warn!(error = %error, "failed to list models");
        if matches!(&self.overlay, Some(o) if o.kind == OverlayKind::ModelPicker) {
            self.close_overlay(sink);
        }
        self.add_notice(
            AppMessageKind::Error,
            format!("Could not list models: {error}"),
            sink,
        );
    }

    /// Clears the transcript and history. Refused while a stream is active.
    pub fn clear_transcript(&mut self, sink: &mut dyn RenderSink) -> bool {
        if self.stream.is_busy() {
            self.set_status("Cannot clear while a response is streaming", sink);
            return false;
        }
        self.session.clear();
        sink.emit(DisplayEvent::TranscriptCleared);
        true
    }
}
