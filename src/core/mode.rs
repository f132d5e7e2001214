//! Input modes and the key transition table.
//!
//! [`Mode::on_key`] is a pure function of the current mode and a symbolic key.
//! It never touches application state; [`crate::core::app::App`] applies the
//! returned [`Intent`].

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Top-level interaction state of the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Typing,
    Submit,
    Sidebar,
    ModelPicker,
    Settings,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Typing,
        Mode::Submit,
        Mode::Sidebar,
        Mode::ModelPicker,
        Mode::Settings,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Typing => "TYPING",
            Mode::Submit => "SUBMIT",
            Mode::Sidebar => "SIDEBAR",
            Mode::ModelPicker => "MODEL_PICKER",
            Mode::Settings => "SETTINGS",
        }
    }

    pub fn is_overlay(self) -> bool {
        matches!(self, Mode::ModelPicker | Mode::Settings)
    }

    pub fn on_key(self, key: Key) -> Intent {
        match self {
            Mode::Typing => match key {
                Key::Escape => Intent::Enter(Mode::Submit),
                _ => Intent::ForwardToInput,
            },
            Mode::Submit => match key {
                Key::Char('t') => Intent::Enter(Mode::Typing),
                Key::Char('s') => Intent::OpenSidebar,
                Key::Enter => Intent::Submit,
                Key::Char('q') => Intent::Quit,
                _ => Intent::Ignore,
            },
            Mode::Sidebar => match key {
                Key::Up | Key::Char('k') => Intent::MoveSidebar(-1),
                Key::Down | Key::Char('j') => Intent::MoveSidebar(1),
                Key::Enter => Intent::ActivateSidebarItem,
                Key::Escape => Intent::LeaveSidebar(Mode::Submit),
                Key::Char('t') => Intent::LeaveSidebar(Mode::Typing),
                Key::Char('q') => Intent::Quit,
                _ => Intent::Ignore,
            },
            Mode::ModelPicker | Mode::Settings => match key {
                Key::Up | Key::Char('k') => Intent::MoveOverlay(-1),
                Key::Down | Key::Char('j') => Intent::MoveOverlay(1),
                Key::Enter => Intent::ApplyOverlay,
                Key::Escape => Intent::DismissOverlay,
                _ => Intent::Ignore,
            },
        }
    }
}

/// What the controller should do in response to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Switch modes, toggling text input focus as needed.
    Enter(Mode),
    /// Focus the sidebar with its cursor reset to the first item.
    OpenSidebar,
    /// Commit the text input as a submission, then return to typing.
    Submit,
    Quit,
    MoveSidebar(isize),
    ActivateSidebarItem,
    /// Clear the sidebar cursor and switch to the given mode.
    LeaveSidebar(Mode),
    MoveOverlay(isize),
    ApplyOverlay,
    /// Close the overlay and discard its selection.
    DismissOverlay,
    ForwardToInput,
    Ignore,
}

/// Symbolic key delivered to the mode controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Escape,
    Char(char),
    Ctrl(char),
    Other,
}

impl From<&KeyEvent> for Key {
    fn from(event: &KeyEvent) -> Self {
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        match event.code {
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Enter if event.modifiers.is_empty() => Key::Enter,
            KeyCode::Esc => Key::Escape,
            KeyCode::Char(c) if ctrl => Key::Ctrl(c.to_ascii_lowercase()),
            KeyCode::Char(c) if !event.modifiers.contains(KeyModifiers::ALT) => Key::Char(c),
            _ => Key::Other,
        }
    }
}
