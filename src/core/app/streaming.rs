//! Lifecycle of the in-flight response.
//!
//! A stream is `Pending` until its first non-empty chunk arrives, then
//! `Streaming` until it commits, fails or is cancelled. Only one stream exists
//! at a time and only the current stream id is honoured.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::backend::BackendError;
use crate::core::chat_stream::{RetrievalRequest, StreamMessage, StreamParams};
use crate::core::message::{AppMessageKind, MessageState};
use crate::core::render::{DisplayEvent, RenderSink, StreamOutcome};
use crate::core::session::{ChatSession, Submission};

pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
pub const SPINNER_PERIOD: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Pending,
    Streaming,
}

#[derive(Debug)]
struct Spinner {
    frame: usize,
    last_tick: Instant,
}

#[derive(Debug)]
pub struct StreamHandle {
    id: u64,
    phase: StreamPhase,
    assistant_index: usize,
    buffer: String,
    cancel_token: CancellationToken,
    spinner: Option<Spinner>,
}

impl StreamHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn assistant_index(&self) -> usize {
        self.assistant_index
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Returns whether a running spinner was stopped. Safe to call repeatedly.
    fn stop_spinner(&mut self) -> bool {
        self.spinner.take().is_some()
    }
}

/// Summary of a stream that left the active state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedStream {
    pub outcome: StreamOutcome,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct StreamCoordinator {
    next_id: u64,
    active: Option<StreamHandle>,
}

impl StreamCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&StreamHandle> {
        self.active.as_ref()
    }

    pub fn current_stream_id(&self) -> Option<u64> {
        self.active.as_ref().map(|handle| handle.id)
    }

    pub fn spinner_frame(&self) -> Option<&'static str> {
        self.active
            .as_ref()
            .and_then(|handle| handle.spinner.as_ref())
            .map(|spinner| SPINNER_FRAMES[spinner.frame])
    }

    pub fn spinner_count(&self) -> usize {
        usize::from(self.spinner_frame().is_some())
    }

    /// Starts tracking a submission. Returns `None` while another stream is
    /// still active.
    pub fn begin(
        &mut self,
        submission: &Submission,
        retrieval: Option<RetrievalRequest>,
        now: Instant,
        sink: &mut dyn RenderSink,
    ) -> Option<StreamParams> {
        if self.is_busy() {
            return None;
        }

        self.next_id = self.next_id.wrapping_add(1);
        let cancel_token = CancellationToken::new();
        let handle = StreamHandle {
            id: self.next_id,
            phase: StreamPhase::Pending,
            assistant_index: submission.assistant_index,
            buffer: String::new(),
            cancel_token: cancel_token.clone(),
            spinner: Some(Spinner {
                frame: 0,
                last_tick: now,
            }),
        };
        debug!(stream_id = handle.id, model = %submission.model, "stream started");
        sink.emit(DisplayEvent::SpinnerFrame {
            index: handle.assistant_index,
            frame: SPINNER_FRAMES[0],
        });
        self.active = Some(handle);

        Some(StreamParams {
            model: submission.model.clone(),
            history: submission.history.clone(),
            retrieval,
            cancel_token,
            stream_id: self.next_id,
        })
    }

    /// Advances the spinner when a full period has elapsed since its last
    /// frame. Returns whether a frame was emitted.
    pub fn tick(&mut self, now: Instant, sink: &mut dyn RenderSink) -> bool {
        let Some(handle) = self.active.as_mut() else {
            return false;
        };
        let index = handle.assistant_index;
        let Some(spinner) = handle.spinner.as_mut() else {
            return false;
        };
        if now.saturating_duration_since(spinner.last_tick) < SPINNER_PERIOD {
            return false;
        }

        spinner.frame = (spinner.frame + 1) % SPINNER_FRAMES.len();
        spinner.last_tick = now;
        sink.emit(DisplayEvent::SpinnerFrame {
            index,
            frame: SPINNER_FRAMES[spinner.frame],
        });
        true
    }

    /// Applies one worker message. Messages for any stream other than the
    /// current one are dropped.
    pub fn apply_message(
        &mut self,
        message: StreamMessage,
        stream_id: u64,
        session: &mut ChatSession,
        sink: &mut dyn RenderSink,
    ) -> Option<FinishedStream> {
        let Some(handle) = self.active.as_mut() else {
            debug!(stream_id, "dropping message with no active stream");
            return None;
        };
        if handle.id != stream_id {
            debug!(stream_id, current = handle.id, "dropping message from stale stream");
            return None;
        }

        match message {
            StreamMessage::Retrieved(prompt) => {
                session.replace_last_user_turn(prompt);
                None
            }
            StreamMessage::Chunk(text) => {
                if text.is_empty() {
                    return None;
                }
                if handle.phase == StreamPhase::Pending {
                    handle.stop_spinner();
                    handle.phase = StreamPhase::Streaming;
                }
                handle.buffer.push_str(&text);
                session.append_to_message(handle.assistant_index, &text);
                sink.emit(DisplayEvent::AssistantUpdated {
                    index: handle.assistant_index,
                    text: handle.buffer.clone(),
                });
                None
            }
            StreamMessage::End => self.finish(StreamOutcome::Committed, None, session, sink),
            StreamMessage::Error(err) => {
                self.finish(StreamOutcome::Failed, Some(err), session, sink)
            }
        }
    }

    /// Signals the worker to stop and freezes whatever arrived so far.
    pub fn cancel(
        &mut self,
        session: &mut ChatSession,
        sink: &mut dyn RenderSink,
    ) -> Option<FinishedStream> {
        let handle = self.active.as_ref()?;
        handle.cancel_token.cancel();
        self.finish(StreamOutcome::Cancelled, None, session, sink)
    }

    fn finish(
        &mut self,
        outcome: StreamOutcome,
        error: Option<BackendError>,
        session: &mut ChatSession,
        sink: &mut dyn RenderSink,
    ) -> Option<FinishedStream> {
        let mut handle = self.active.take()?;
        handle.stop_spinner();
        let index = handle.assistant_index;

        match outcome {
            StreamOutcome::Committed => {
                session.finalize_message(index, MessageState::Complete);
                session.record_assistant_turn(handle.buffer.clone());
            }
            StreamOutcome::Failed | StreamOutcome::Cancelled => {
                session.finalize_message(index, MessageState::Incomplete);
                if handle.buffer.is_empty() {
                    if session.remove_empty_placeholder(index) {
                        sink.emit(DisplayEvent::MessageRemoved { index });
                    }
                } else {
                    session.record_assistant_turn(handle.buffer.clone());
                }
            }
        }

        if let Some(err) = error {
            debug!(stream_id = handle.id, error = %err, "stream failed");
            let notice = session.add_app_message(AppMessageKind::Error, err.to_string());
            sink.emit(DisplayEvent::MessageAppended { index: notice });
        }

        debug!(stream_id = handle.id, ?outcome, "stream finished");
        sink.emit(DisplayEvent::StreamFinished { index, outcome });
        Some(FinishedStream {
            outcome,
            text: handle.buffer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChatMessage;
    use crate::utils::test_utils::RecordingSink;

    fn start(session: &mut ChatSession, coordinator: &mut StreamCoordinator) -> (u64, Instant) {
        let submission = session.submit("Hello").expect("submission");
        let now = Instant::now();
        let params = coordinator
            .begin(&submission, None, now, &mut RecordingSink::default())
            .expect("params");
        (params.stream_id, now)
    }

    #[test]
    fn chunks_each_produce_one_update_in_order() {
        let mut session = ChatSession::new("gemma3:4b", None);
        let mut coordinator = StreamCoordinator::new();
        let (id, _) = start(&mut session, &mut coordinator);
        let mut sink = RecordingSink::default();

        for chunk in ["Hel", "lo", " world"] {
            coordinator.apply_message(StreamMessage::Chunk(chunk.into()), id, &mut session, &mut sink);
        }

        assert_eq!(
            sink.assistant_updates(),
            vec!["Hel".to_string(), "Hello".into(), "Hello world".into()]
        );
        assert_eq!(session.message_text(1), Some("Hello world"));
    }

    #[test]
    fn spinner_stops_on_first_non_empty_chunk() {
        let mut session = ChatSession::new("m", None);
        let mut coordinator = StreamCoordinator::new();
        let (id, now) = start(&mut session, &mut coordinator);
        let mut sink = RecordingSink::default();

        assert!(!coordinator.tick(now + Duration::from_millis(50), &mut sink));
        assert!(coordinator.tick(now + SPINNER_PERIOD, &mut sink));
        assert_eq!(coordinator.spinner_frame(), Some(SPINNER_FRAMES[1]));

        coordinator.apply_message(StreamMessage::Chunk(String::new()), id, &mut session, &mut sink);
        assert_eq!(coordinator.active().map(StreamHandle::phase), Some(StreamPhase::Pending));

        coordinator.apply_message(StreamMessage::Chunk("x".into()), id, &mut session, &mut sink);
        assert_eq!(coordinator.spinner_count(), 0);
        assert_eq!(coordinator.active().map(StreamHandle::phase), Some(StreamPhase::Streaming));
        assert!(!coordinator.tick(now + SPINNER_PERIOD * 5, &mut sink));
    }

    #[test]
    fn spinner_frames_wrap_around() {
        let mut session = ChatSession::new("m", None);
        let mut coordinator = StreamCoordinator::new();
        let (_, now) = start(&mut session, &mut coordinator);
        let mut sink = RecordingSink::default();
        for step in 1..=SPINNER_FRAMES.len() as u32 {
            coordinator.tick(now + SPINNER_PERIOD * step, &mut sink);
        }
        assert_eq!(coordinator.spinner_frame(), Some(SPINNER_FRAMES[0]));
    }

    #[test]
    fn second_stream_is_rejected_while_busy() {
        let mut session = ChatSession::new("m", None);
        let mut coordinator = StreamCoordinator::new();
        start(&mut session, &mut coordinator);
        let again = session.submit("again").expect("submission");
        assert!(coordinator
            .begin(&again, None, Instant::now(), &mut RecordingSink::default())
            .is_none());
        assert_eq!(coordinator.spinner_count(), 1);
    }

    #[test]
    fn end_commits_text_to_history() {
        let mut session = ChatSession::new("m", None);
        let mut coordinator = StreamCoordinator::new();
        let (id, _) = start(&mut session, &mut coordinator);
        let mut sink = RecordingSink::default();
        coordinator.apply_message(StreamMessage::Chunk("Hi".into()), id, &mut session, &mut sink);
        let finished = coordinator
            .apply_message(StreamMessage::End, id, &mut session, &mut sink)
            .expect("finished");

        assert_eq!(finished.outcome, StreamOutcome::Committed);
        assert!(!coordinator.is_busy());
        assert_eq!(
            session.history(),
            &[ChatMessage::user("Hello"), ChatMessage::assistant("Hi")]
        );
        assert_eq!(session.messages()[1].state, MessageState::Complete);
    }

    #[test]
    fn errors_keep_partial_text_as_incomplete() {
        let mut session = ChatSession::new("m", None);
        let mut coordinator = StreamCoordinator::new();
        let (id, _) = start(&mut session, &mut coordinator);
        let mut sink = RecordingSink::default();
        coordinator.apply_message(StreamMessage::Chunk("par".into()), id, &mut session, &mut sink);
        coordinator.apply_message(
            StreamMessage::Error(BackendError::Interrupted),
            id,
            &mut session,
            &mut sink,
        );

        assert!(session.messages()[1].is_incomplete());
        assert_eq!(session.messages()[2].role.as_str(), "app/error");
        assert_eq!(session.history().last(), Some(&ChatMessage::assistant("par")));
    }

    #[test]
    fn errors_before_text_replace_the_placeholder() {
        let mut session = ChatSession::new("m", None);
        let mut coordinator = StreamCoordinator::new();
        let (id, _) = start(&mut session, &mut coordinator);
        let mut sink = RecordingSink::default();
        coordinator.apply_message(
            StreamMessage::Error(BackendError::Unavailable("refused".into())),
            id,
            &mut session,
            &mut sink,
        );

        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].role.as_str(), "app/error");
        assert_eq!(session.history().len(), 1);
        assert!(sink.events.contains(&DisplayEvent::MessageRemoved { index: 1 }));
    }

    #[test]
    fn stale_stream_messages_are_dropped() {
        let mut session = ChatSession::new("m", None);
        let mut coordinator = StreamCoordinator::new();
        let (id, _) = start(&mut session, &mut coordinator);
        let mut sink = RecordingSink::default();
        assert!(coordinator
            .apply_message(StreamMessage::End, id + 1, &mut session, &mut sink)
            .is_none());
        coordinator.apply_message(StreamMessage::Chunk("x".into()), id + 1, &mut session, &mut sink);
        assert!(sink.events.is_empty());
        assert!(coordinator.is_busy());
    }

    #[test]
    fn cancel_triggers_the_token_and_freezes_text() {
        let mut session = ChatSession::new("m", None);
        let mut coordinator = StreamCoordinator::new();
        let submission = session.submit("Hello").expect("submission");
        let params = coordinator
            .begin(&submission, None, Instant::now(), &mut RecordingSink::default())
            .expect("params");
        let mut sink = RecordingSink::default();
        coordinator.apply_message(
            StreamMessage::Chunk("so far".into()),
            params.stream_id,
            &mut session,
            &mut sink,
        );

        let finished = coordinator.cancel(&mut session, &mut sink).expect("finished");
        assert_eq!(finished.outcome, StreamOutcome::Cancelled);
        assert!(params.cancel_token.is_cancelled());
        assert!(session.messages()[1].is_incomplete());
        assert!(coordinator.cancel(&mut session, &mut sink).is_none());
    }

    #[test]
    fn retrieved_prompt_rewrites_history_only() {
        let mut session = ChatSession::new("m", None);
        let mut coordinator = StreamCoordinator::new();
        let (id, _) = start(&mut session, &mut coordinator);
        let mut sink = RecordingSink::default();
        coordinator.apply_message(
            StreamMessage::Retrieved("Context:\nx\n\nQuestion: Hello".into()),
            id,
            &mut session,
            &mut sink,
        );
        assert_eq!(session.messages()[0].content, "Hello");
        assert_eq!(session.history()[0].content, "Context:\nx\n\nQuestion: Hello");
    }
}
