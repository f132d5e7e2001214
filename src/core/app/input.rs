use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::{Modifier, Style};
use tui_textarea::{CursorMove, Input, TextArea};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Plain Enter: the current text should be submitted.
    Submitted(String),
    Edited,
    Ignored,
}

pub(crate) fn build_textarea(text: &str, focused: bool) -> TextArea<'static> {
    let lines: Vec<String> = if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').map(str::to_string).collect()
    };
    let mut textarea = TextArea::from(lines);
    textarea.set_cursor_line_style(Style::default());
    set_cursor_visible(&mut textarea, focused);
    if !text.is_empty() {
        textarea.move_cursor(CursorMove::Bottom);
        textarea.move_cursor(CursorMove::End);
    }
    textarea
}

fn set_cursor_visible(textarea: &mut TextArea<'static>, visible: bool) {
    let style = if visible {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    textarea.set_cursor_style(style);
}

const PLACEHOLDER: &str = "Type a message, Esc for commands";

/// Multi-line prompt editor below the transcript.
pub struct TextInput {
    textarea: TextArea<'static>,
    focused: bool,
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

impl TextInput {
    pub fn new() -> Self {
        let mut input = Self {
            textarea: build_textarea("", true),
            focused: true,
        };
        input.textarea.set_placeholder_text(PLACEHOLDER);
        input
    }

    /// Enter submits, Alt+Enter inserts a newline, everything else edits.
    pub fn handle_key(&mut self, event: KeyEvent) -> InputOutcome {
        match event.code {
            KeyCode::Enter if event.modifiers.is_empty() => InputOutcome::Submitted(self.text()),
            KeyCode::Enter if event.modifiers.contains(KeyModifiers::ALT) => {
                self.textarea.insert_newline();
                InputOutcome::Edited
            }
            _ => {
                if self.textarea.input(Input::from(event)) {
                    InputOutcome::Edited
                } else {
                    InputOutcome::Ignored
                }
            }
        }
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn set_text(&mut self, text: &str) {
        self.textarea = build_textarea(text, self.focused);
        self.textarea.set_placeholder_text(PLACEHOLDER);
    }

    pub fn clear(&mut self) {
        self.set_text("");
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        set_cursor_visible(&mut self.textarea, focused);
    }

    pub fn line_count(&self) -> usize {
        self.textarea.lines().len().max(1)
    }

    pub fn textarea(&self) -> &TextArea<'static> {
        &self.textarea
    }

    pub fn insert_text(&mut self, text: &str) -> bool {
        self.textarea.insert_str(text)
    }
}
