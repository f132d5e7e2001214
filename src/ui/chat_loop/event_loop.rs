//! Event polling, dispatching, and UI rendering loop.
//!
//! The loop owns the [`App`] outright. Each pass drains terminal input,
//! worker output and background action results, advances the spinner, and
//! redraws at most once per frame. Nothing else touches controller state, so
//! no locking is involved.

use std::{
    error::Error,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::app::{apply_actions, App, AppAction, AppActionDispatcher, AppCommand};
use crate::core::backend::ModelLister;
use crate::core::chat_stream::{ChatStreamService, StreamReceiver};
use crate::core::config::Config;
use crate::core::render::RenderSink;
use crate::ui::renderer::ui;
use crate::ui::sink::TerminalSink;

use super::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};
use super::setup::{bootstrap_app, ChatSetup};
use super::ChatOptions;

const MAX_FPS: u64 = 60;
const IDLE_SLEEP: Duration = Duration::from_millis(16);

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

/// Handles the event loop needs to run [`AppCommand`]s.
pub(crate) struct Services {
    pub stream: ChatStreamService,
    pub models: Arc<dyn ModelLister>,
    pub dispatcher: AppActionDispatcher,
}

fn spawn_model_loader(models: Arc<dyn ModelLister>, dispatcher: AppActionDispatcher) {
    tokio::spawn(async move {
        let action = match models.list_models().await {
            Ok(models) => {
                debug!(count = models.len(), "model list loaded");
                AppAction::ModelsLoaded { models }
            }
            Err(error) => {
                warn!(%error, "model list failed");
                AppAction::ModelsLoadFailed { error }
            }
        };
        dispatcher.dispatch(action);
    });
}

pub(crate) fn execute_command(command: AppCommand, services: &Services) {
    match command {
        AppCommand::SpawnStream(params) => {
            debug!(stream_id = params.stream_id, model = %params.model, "spawning stream");
            services.stream.spawn_stream(params);
        }
        AppCommand::LoadModels => {
            spawn_model_loader(Arc::clone(&services.models), services.dispatcher.clone());
        }
    }
}

pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    let without_crlf = text.replace("\r\n", "\n");
    let without_cr = without_crlf.replace('\r', "\n");
    without_cr
        .replace('\t', "    ")
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

/// Applies every queued terminal event. Returns whether any arrived.
pub(crate) fn process_ui_events(
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    services: &Services,
    sink: &mut dyn RenderSink,
) -> bool {
    let mut events_processed = false;

    while let Ok(ev) = event_rx.try_recv() {
        events_processed = true;
        match ev {
            UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if let Some(command) = app.handle_key(key, sink) {
                    execute_command(command, services);
                }
                if app.exit_requested() {
                    break;
                }
            }
            UiEvent::Crossterm(Event::Paste(text)) => {
                app.handle_paste(&sanitize_pasted_text(&text), sink);
            }
            UiEvent::Crossterm(_) => {}
        }
    }

    events_processed
}

/// Feeds worker messages to the controller one at a time, in arrival order.
pub(crate) fn process_stream_updates(
    app: &mut App,
    rx: &mut StreamReceiver,
    sink: &mut dyn RenderSink,
) -> bool {
    let mut received_any = false;
    while let Ok((message, stream_id)) = rx.try_recv() {
        app.apply_stream_message(message, stream_id, sink);
        received_any = true;
    }
    received_any
}

pub(crate) fn drain_action_queue(
    app: &mut App,
    action_rx: &mut mpsc::UnboundedReceiver<AppAction>,
    sink: &mut dyn RenderSink,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(action) = action_rx.try_recv() {
        pending.push(action);
    }

    if pending.is_empty() {
        return false;
    }
    apply_actions(app, pending, sink);
    true
}

fn try_draw_frame(
    terminal: &mut ChatTerminal,
    app: &App,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    terminal.draw(|f| ui(f, app))?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

pub async fn run_chat(options: ChatOptions) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let ChatSetup {
        mut app,
        backend,
        models,
        retriever,
    } = bootstrap_app(options, &config);

    let (stream, mut stream_rx) = ChatStreamService::new(backend, retriever);
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppAction>();
    let services = Services {
        stream,
        models,
        dispatcher: AppActionDispatcher::new(action_tx),
    };

    let mut terminal = setup_terminal()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;
    let mut sink = TerminalSink::new();

    let result: Result<(), Box<dyn Error>> = loop {
        if app.exit_requested() {
            break Ok(());
        }

        if let Err(err) = try_draw_frame(
            &mut terminal,
            &app,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        ) {
            break Err(err.into());
        }

        let events_processed = process_ui_events(&mut app, &mut event_rx, &services, &mut sink);
        let received_any = process_stream_updates(&mut app, &mut stream_rx, &mut sink);
        let actions_applied = drain_action_queue(&mut app, &mut action_rx, &mut sink);
        app.tick(Instant::now(), &mut sink);

        if events_processed || sink.take_redraw() {
            request_redraw = true;
        }

        let idle = !events_processed && !received_any && !actions_applied && !request_redraw;
        if idle {
            tokio::time::sleep(IDLE_SLEEP).await;
        }
    };

    app.cancel_stream(&mut sink);
    event_reader_handle.abort();
    restore_terminal(&mut terminal)?;
    info!("chat session ended");

    result
}
