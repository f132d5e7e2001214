use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::{Input, TextArea};

use super::input::build_textarea;
use crate::core::mode::Mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutcome {
    Save(String),
    Cancel,
    Editing,
}

/// Full-screen editor for the preprompt file. While it is open it receives
/// every key except Ctrl+C.
pub struct PrepromptEditor {
    textarea: TextArea<'static>,
    return_mode: Mode,
}

impl PrepromptEditor {
    pub fn new(initial: &str, return_mode: Mode) -> Self {
        Self {
            textarea: build_textarea(initial.trim_end_matches('\n'), true),
            return_mode,
        }
    }

    pub fn return_mode(&self) -> Mode {
        self.return_mode
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn textarea(&self) -> &TextArea<'static> {
        &self.textarea
    }

    pub fn insert_text(&mut self, text: &str) {
        self.textarea.insert_str(text);
    }

    pub fn handle_key(&mut self, event: KeyEvent) -> EditorOutcome {
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        match event.code {
            KeyCode::Esc => EditorOutcome::Cancel,
            KeyCode::Char('s') | KeyCode::Char('S') if ctrl => EditorOutcome::Save(self.text()),
            KeyCode::Enter => {
                self.textarea.insert_newline();
                EditorOutcome::Editing
            }
            _ => {
                self.textarea.input(Input::from(event));
                EditorOutcome::Editing
            }
        }
    }
}
