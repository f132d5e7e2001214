//! Display events emitted by the controller.
//!
//! The controller never draws. It reports what changed through a
//! [`RenderSink`], and the terminal layer decides how and when to repaint.

use crate::core::mode::Mode;

/// How a stream left the active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Committed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    MessageAppended { index: usize },
    MessageRemoved { index: usize },
    /// Spinner frame to show in place of the pending assistant text.
    SpinnerFrame { index: usize, frame: &'static str },
    /// Full assistant text after one more chunk arrived.
    AssistantUpdated { index: usize, text: String },
    StreamFinished { index: usize, outcome: StreamOutcome },
    ModeChanged { mode: Mode },
    OverlayChanged,
    TranscriptCleared,
    Status { message: String },
}

pub trait RenderSink {
    fn emit(&mut self, event: DisplayEvent);
}
