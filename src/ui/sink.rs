use tracing::trace;

use crate::core::render::{DisplayEvent, RenderSink};

/// Collapses display events into a single "needs redraw" flag. The renderer
/// always draws the whole frame from [`crate::core::app::App`].
#[derive(Debug, Default)]
pub struct TerminalSink {
    redraw: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self { redraw: true }
    }

    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }
}

impl RenderSink for TerminalSink {
    fn emit(&mut self, event: DisplayEvent) {
        trace!(?event, "display event");
        self.redraw = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mode::Mode;

    #[test]
    fn any_event_requests_a_single_redraw() {
        let mut sink = TerminalSink::default();
        assert!(!sink.take_redraw());

        sink.emit(DisplayEvent::ModeChanged { mode: Mode::Sidebar });
        sink.emit(DisplayEvent::OverlayChanged);
        assert!(sink.take_redraw());
        assert!(!sink.take_redraw());
    }
}
