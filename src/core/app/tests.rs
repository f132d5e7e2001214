use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::tempdir;

use super::*;
use crate::api::ChatMessage;
use crate::core::backend::{GenerationChunk, ModelLister};
use crate::core::chat_stream::{ChatStreamService, StreamParams};
use crate::core::message::MessageState;
use crate::utils::test_utils::{
    create_test_app, create_test_app_with_preprompt, ctrl, key, NullSink, RecordingSink,
    ScriptedBackend, StaticModelLister, StaticRetriever,
};

fn press(app: &mut App, code: KeyCode) -> Option<AppCommand> {
    app.handle_key(key(code), &mut NullSink)
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

fn spawned(command: Option<AppCommand>) -> StreamParams {
    match command {
        Some(AppCommand::SpawnStream(params)) => params,
        Some(AppCommand::LoadModels) => panic!("expected a stream, got LoadModels"),
        None => panic!("expected a stream"),
    }
}

fn app_in_mode(mode: Mode) -> App {
    let mut app = create_test_app();
    match mode {
        Mode::Typing => {}
        Mode::Submit => {
            press(&mut app, KeyCode::Esc);
        }
        Mode::Sidebar => {
            press(&mut app, KeyCode::Esc);
            press(&mut app, KeyCode::Char('s'));
        }
        Mode::ModelPicker => {
            press(&mut app, KeyCode::Esc);
            press(&mut app, KeyCode::Char('s'));
            press(&mut app, KeyCode::Enter);
            app.apply_models_loaded(vec!["a".into(), "b".into()], &mut NullSink);
        }
        Mode::Settings => {
            press(&mut app, KeyCode::Esc);
            press(&mut app, KeyCode::Char('s'));
            press(&mut app, KeyCode::Up);
            press(&mut app, KeyCode::Enter);
        }
    }
    assert_eq!(app.mode, mode);
    app
}

/// Mode after the key, or `None` when the key requests exit.
fn expected_mode(mode: Mode, code: KeyCode) -> Option<Mode> {
    use KeyCode::*;
    match (mode, code) {
        (Mode::Typing, Esc) => Some(Mode::Submit),
        (Mode::Typing, _) => Some(Mode::Typing),
        (Mode::Submit, Char('t')) | (Mode::Submit, Enter) => Some(Mode::Typing),
        (Mode::Submit, Char('s')) => Some(Mode::Sidebar),
        (Mode::Submit, Char('q')) => None,
        (Mode::Submit, _) => Some(Mode::Submit),
        (Mode::Sidebar, Enter) => Some(Mode::ModelPicker),
        (Mode::Sidebar, Esc) => Some(Mode::Submit),
        (Mode::Sidebar, Char('t')) => Some(Mode::Typing),
        (Mode::Sidebar, Char('q')) => None,
        (Mode::Sidebar, _) => Some(Mode::Sidebar),
        (overlay, Enter) | (overlay, Esc) if overlay.is_overlay() => Some(Mode::Sidebar),
        (overlay, _) => Some(overlay),
    }
}

#[test]
fn every_mode_and_key_follows_the_transition_table() {
    let keys = [
        KeyCode::Up,
        KeyCode::Down,
        KeyCode::Enter,
        KeyCode::Esc,
        KeyCode::Char('t'),
        KeyCode::Char('s'),
        KeyCode::Char('q'),
        KeyCode::Char('k'),
        KeyCode::Char('j'),
        KeyCode::Char('x'),
        KeyCode::F(5),
        KeyCode::Tab,
    ];

    for mode in Mode::ALL {
        for code in keys {
            let mut app = app_in_mode(mode);
            press(&mut app, code);
            match expected_mode(mode, code) {
                Some(expected) => {
                    assert!(!app.exit_requested(), "{mode:?} + {code:?} should not exit");
                    assert_eq!(app.mode, expected, "{mode:?} + {code:?}");
                }
                None => assert!(app.exit_requested(), "{mode:?} + {code:?} should exit"),
            }
        }
    }
}

#[test]
fn ctrl_c_exits_from_every_mode() {
    for mode in Mode::ALL {
        let mut app = app_in_mode(mode);
        app.handle_key(ctrl('c'), &mut NullSink);
        assert!(app.exit_requested(), "{mode:?}");
    }
}

#[test]
fn typing_mode_forwards_keys_to_the_input() {
    let mut app = create_test_app();
    type_text(&mut app, "sq");
    assert_eq!(app.input.text(), "sq");
    app.handle_key(
        KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT),
        &mut NullSink,
    );
    type_text(&mut app, "t");
    assert_eq!(app.input.text(), "sq\nt");
    assert!(!app.exit_requested());
}

#[test]
fn input_focus_follows_typing_mode() {
    let mut app = create_test_app();
    assert!(app.input.is_focused());
    press(&mut app, KeyCode::Esc);
    assert!(!app.input.is_focused());
    press(&mut app, KeyCode::Char('t'));
    assert!(app.input.is_focused());
}

#[test]
fn whitespace_submissions_change_nothing() {
    let mut app = create_test_app();
    type_text(&mut app, "   ");
    assert!(press(&mut app, KeyCode::Enter).is_none());

    press(&mut app, KeyCode::Esc);
    assert!(press(&mut app, KeyCode::Enter).is_none());

    assert!(app.session.messages().is_empty());
    assert!(app.session.history().is_empty());
    assert!(!app.stream.is_busy());
    assert_eq!(app.mode, Mode::Typing);
}

#[test]
fn submit_then_stream_commits_history() {
    let mut app = create_test_app();
    type_text(&mut app, "Hello");
    press(&mut app, KeyCode::Esc);
    let params = spawned(press(&mut app, KeyCode::Enter));

    assert_eq!(params.model, "gemma3:4b");
    assert_eq!(params.history, vec![ChatMessage::user("Hello")]);
    assert_eq!(app.input.text(), "");
    assert_eq!(app.mode, Mode::Typing);

    let mut sink = RecordingSink::default();
    for message in [
        StreamMessage::Chunk("Hi".into()),
        StreamMessage::Chunk(" there!".into()),
        StreamMessage::End,
    ] {
        app.apply_stream_message(message, params.stream_id, &mut sink);
    }

    assert_eq!(
        app.session.history(),
        &[ChatMessage::user("Hello"), ChatMessage::assistant("Hi there!")]
    );
    assert_eq!(app.session.messages()[1].state, MessageState::Complete);
    assert_eq!(app.mode, Mode::Typing);
    assert!(!app.stream.is_busy());
}

#[test]
fn three_chunks_give_three_visible_states() {
    let mut app = create_test_app();
    type_text(&mut app, "Hi");
    let params = spawned(press(&mut app, KeyCode::Enter));
    let mut sink = RecordingSink::default();
    for chunk in ["Hel", "lo", " world"] {
        app.apply_stream_message(StreamMessage::Chunk(chunk.into()), params.stream_id, &mut sink);
    }
    app.apply_stream_message(StreamMessage::End, params.stream_id, &mut sink);

    assert_eq!(
        sink.assistant_updates(),
        vec!["Hel".to_string(), "Hello".into(), "Hello world".into()]
    );
    assert_eq!(app.session.message_text(1), Some("Hello world"));
}

#[test]
fn submissions_are_rejected_while_streaming() {
    let mut app = create_test_app();
    type_text(&mut app, "first");
    let params = spawned(press(&mut app, KeyCode::Enter));

    type_text(&mut app, "second");
    assert!(press(&mut app, KeyCode::Enter).is_none());
    assert_eq!(app.input.text(), "second");
    assert_eq!(app.session.messages().len(), 2);
    assert!(app.status.is_some());
    assert_eq!(app.stream.spinner_count(), 1);

    app.apply_stream_message(StreamMessage::End, params.stream_id, &mut NullSink);
    assert!(press(&mut app, KeyCode::Enter).is_some());
}

#[test]
fn at_most_one_spinner_runs() {
    let mut app = create_test_app();
    type_text(&mut app, "one");
    press(&mut app, KeyCode::Enter);
    type_text(&mut app, "two");
    press(&mut app, KeyCode::Enter);

    let mut sink = RecordingSink::default();
    let start = Instant::now();
    for step in 1..=5 {
        app.tick(start + Duration::from_millis(100 * step), &mut sink);
        assert!(app.stream.spinner_count() <= 1);
    }
    assert!(sink.spinner_frames() <= 5);
}

#[test]
fn backend_failure_without_text_becomes_an_error_notice() {
    let mut app = create_test_app();
    type_text(&mut app, "Hello");
    let params = spawned(press(&mut app, KeyCode::Enter));
    app.apply_stream_message(
        StreamMessage::Error(BackendError::Unavailable("connection refused".into())),
        params.stream_id,
        &mut NullSink,
    );

    let messages = app.session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role.as_str(), "app/error");
    assert!(messages[1].content.contains("connection refused"));
    assert_eq!(app.session.history(), &[ChatMessage::user("Hello")]);
}

#[test]
fn sidebar_wraps_in_both_directions() {
    let mut app = app_in_mode(Mode::Sidebar);
    press(&mut app, KeyCode::Up);
    assert_eq!(app.sidebar.selected_key(), Some(SIDEBAR_SETTINGS));
    press(&mut app, KeyCode::Char('j'));
    assert_eq!(app.sidebar.selected_key(), Some(SIDEBAR_MODEL));
}

#[test]
fn sidebar_opens_with_cursor_reset() {
    let mut app = app_in_mode(Mode::Sidebar);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Esc);
    press(&mut app, KeyCode::Char('s'));
    assert_eq!(app.sidebar.cursor(), 0);
    assert_eq!(app.sidebar.highlighted(), Some(0));
}

#[test]
fn down_twice_then_enter_opens_settings() {
    let mut app = create_test_app();
    press(&mut app, KeyCode::Esc);
    press(&mut app, KeyCode::Char('s'));
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Down);
    assert_eq!(app.sidebar.selected_key(), Some(SIDEBAR_SETTINGS));

    assert!(press(&mut app, KeyCode::Enter).is_none());
    assert_eq!(app.mode, Mode::Settings);
    let overlay = app.overlay.as_ref().expect("settings overlay");
    assert_eq!(overlay.list.items(), &["Change preprompt".to_string()]);
    assert_eq!(overlay.list.cursor(), 0);
}

#[test]
fn overlay_cursor_clamps_in_both_directions() {
    let mut app = app_in_mode(Mode::ModelPicker);
    for _ in 0..5 {
        press(&mut app, KeyCode::Down);
    }
    assert_eq!(app.overlay.as_ref().and_then(Overlay::selected), Some("b"));
    for _ in 0..5 {
        press(&mut app, KeyCode::Char('k'));
    }
    assert_eq!(app.overlay.as_ref().and_then(Overlay::selected), Some("a"));
}

#[test]
fn picking_a_model_updates_session_and_sidebar() {
    let mut app = app_in_mode(Mode::Sidebar);
    assert!(matches!(
        press(&mut app, KeyCode::Enter),
        Some(AppCommand::LoadModels)
    ));
    assert_eq!(app.mode, Mode::ModelPicker);
    assert!(app.overlay.as_ref().is_some_and(|o| o.loading));

    app.apply_models_loaded(vec!["a".into(), "b".into(), "c".into()], &mut NullSink);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.session.model(), "b");
    assert_eq!(app.mode, Mode::Sidebar);
    assert_eq!(app.sidebar.label(SIDEBAR_MODEL), Some("b"));
    assert!(app.overlay.is_none());
}

#[test]
fn escape_discards_the_picker_selection() {
    let mut app = app_in_mode(Mode::ModelPicker);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.mode, Mode::Sidebar);
    assert_eq!(app.session.model(), "gemma3:4b");
    assert!(app.overlay.is_none());
}

#[test]
fn enter_on_a_loading_picker_does_nothing() {
    let mut app = app_in_mode(Mode::Sidebar);
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.mode, Mode::ModelPicker);
    assert_eq!(app.session.model(), "gemma3:4b");
}

#[test]
fn late_model_lists_are_ignored() {
    let mut app = app_in_mode(Mode::Sidebar);
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Esc);
    app.apply_models_loaded(vec!["a".into()], &mut NullSink);
    assert!(app.overlay.is_none());
    assert_eq!(app.mode, Mode::Sidebar);
}

#[test]
fn model_list_failure_closes_picker_with_notice() {
    let mut app = app_in_mode(Mode::Sidebar);
    press(&mut app, KeyCode::Enter);
    apply_actions(
        &mut app,
        [AppAction::ModelsLoadFailed {
            error: BackendError::Unavailable("refused".into()),
        }],
        &mut NullSink,
    );

    assert!(app.overlay.is_none());
    assert_eq!(app.mode, Mode::Sidebar);
    let notice = app.session.messages().last().expect("notice");
    assert_eq!(notice.role.as_str(), "app/error");
}

#[test]
fn closing_without_an_overlay_is_a_no_op() {
    let mut app = app_in_mode(Mode::Submit);
    app.close_overlay(&mut NullSink);
    assert_eq!(app.mode, Mode::Submit);
}

#[test]
fn rag_item_toggles_in_place() {
    let mut app = app_in_mode(Mode::Sidebar);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.mode, Mode::Sidebar);
    assert!(app.rag.enabled);
    assert_eq!(app.sidebar.label(SIDEBAR_RAG), Some("RAG: on"));

    press(&mut app, KeyCode::Esc);
    type_text(&mut app, "t");
    type_text(&mut app, "Hello");
    let params = spawned(press(&mut app, KeyCode::Enter));
    let retrieval = params.retrieval.expect("retrieval request");
    assert_eq!(retrieval.query, "Hello");
    assert_eq!(retrieval.k, 5);
}

#[test]
fn preprompt_editor_saves_and_updates_history() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("preprompt.txt");
    let mut app = create_test_app_with_preprompt(path.clone());

    press(&mut app, KeyCode::Esc);
    press(&mut app, KeyCode::Char('s'));
    press(&mut app, KeyCode::Up);
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);
    assert!(app.editor.is_some());
    assert_eq!(app.mode, Mode::Sidebar);

    // Keys that would normally quit go to the editor.
    type_text(&mut app, "Be brief, q");
    assert!(!app.exit_requested());
    app.handle_key(ctrl('s'), &mut NullSink);

    assert!(app.editor.is_none());
    assert_eq!(app.mode, Mode::Sidebar);
    assert_eq!(std::fs::read_to_string(&path).expect("saved"), "Be brief, q");
    assert_eq!(app.session.preprompt(), Some("Be brief, q"));
}

#[test]
fn preprompt_editor_escape_discards() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("preprompt.txt");
    std::fs::write(&path, "original").expect("write");
    let mut app = create_test_app_with_preprompt(path.clone());
    assert_eq!(app.session.preprompt(), Some("original"));

    press(&mut app, KeyCode::Esc);
    press(&mut app, KeyCode::Char('s'));
    press(&mut app, KeyCode::Up);
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);
    type_text(&mut app, " edited");
    press(&mut app, KeyCode::Esc);

    assert!(app.editor.is_none());
    assert_eq!(app.mode, Mode::Sidebar);
    assert_eq!(std::fs::read_to_string(&path).expect("read"), "original");
}

#[test]
fn clear_is_refused_while_streaming() {
    let mut app = create_test_app();
    type_text(&mut app, "Hello");
    let params = spawned(press(&mut app, KeyCode::Enter));
    assert!(!app.clear_transcript(&mut NullSink));
    assert_eq!(app.session.messages().len(), 2);

    app.apply_stream_message(StreamMessage::End, params.stream_id, &mut NullSink);
    assert!(app.clear_transcript(&mut NullSink));
    assert!(app.session.messages().is_empty());
}

#[test]
fn quitting_cancels_the_active_stream() {
    let mut app = create_test_app();
    type_text(&mut app, "Hello");
    let params = spawned(press(&mut app, KeyCode::Enter));
    app.apply_stream_message(StreamMessage::Chunk("part".into()), params.stream_id, &mut NullSink);

    app.handle_key(ctrl('c'), &mut NullSink);
    assert!(app.exit_requested());
    assert!(params.cancel_token.is_cancelled());
    assert!(app.session.messages()[1].is_incomplete());
}

#[tokio::test]
async fn worker_output_drives_the_transcript() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(GenerationChunk::text("Hi")),
        Ok(GenerationChunk::text(" there!")),
        Ok(GenerationChunk::done()),
    ]));
    let (service, mut rx) =
        ChatStreamService::new(backend.clone(), Arc::new(StaticRetriever::new(Vec::new())));
    let mut app = create_test_app();
    type_text(&mut app, "Hello");
    press(&mut app, KeyCode::Esc);
    let params = spawned(press(&mut app, KeyCode::Enter));

    service.spawn_stream(params).await.expect("worker");
    drop(service);
    let mut sink = RecordingSink::default();
    while let Some((message, id)) = rx.recv().await {
        app.apply_stream_message(message, id, &mut sink);
    }

    assert_eq!(
        app.session.history(),
        &[ChatMessage::user("Hello"), ChatMessage::assistant("Hi there!")]
    );
    assert_eq!(backend.requests()[0].1, vec![ChatMessage::user("Hello")]);
    assert_eq!(app.mode, Mode::Typing);
}

#[tokio::test]
async fn static_lister_feeds_the_picker() {
    let lister = StaticModelLister::new(Ok(vec!["a", "b", "c"]));
    let mut app = app_in_mode(Mode::Sidebar);
    press(&mut app, KeyCode::Enter);
    let models = lister.list_models().await.expect("models");
    apply_action(&mut app, AppAction::ModelsLoaded { models }, &mut NullSink);
    assert_eq!(app.overlay.as_ref().map(|o| o.list.len()), Some(3));
}
