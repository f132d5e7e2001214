use crate::core::mode::Mode;
use crate::core::selection::SelectableList;

pub const SIDEBAR_MODEL: &str = "model";
pub const SIDEBAR_RAG: &str = "rag";
pub const SIDEBAR_SETTINGS: &str = "settings";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarItem {
    pub key: &'static str,
    pub label: String,
}

impl SidebarItem {
    fn new(key: &'static str, label: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
        }
    }
}

pub fn rag_label(enabled: bool) -> String {
    format!("RAG: {}", if enabled { "on" } else { "off" })
}

/// Left-hand panel: a read-only mode indicator above a wrapping list of
/// activatable entries.
#[derive(Debug, Clone)]
pub struct Sidebar {
    mode_label: &'static str,
    list: SelectableList<SidebarItem>,
    focused: bool,
}

impl Sidebar {
    pub fn new(model: &str, rag_enabled: bool) -> Self {
        let items = vec![
            SidebarItem::new(SIDEBAR_MODEL, model),
            SidebarItem::new(SIDEBAR_RAG, rag_label(rag_enabled)),
            SidebarItem::new(SIDEBAR_SETTINGS, "Settings"),
        ];
        Self {
            mode_label: Mode::default().label(),
            list: SelectableList::wrapping(items),
            focused: false,
        }
    }

    pub fn mode_label(&self) -> &'static str {
        self.mode_label
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode_label = mode.label();
        self.focused = mode == Mode::Sidebar;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn items(&self) -> &[SidebarItem] {
        self.list.items()
    }

    pub fn cursor(&self) -> usize {
        self.list.cursor()
    }

    /// Index to highlight, if the sidebar currently owns the keyboard.
    pub fn highlighted(&self) -> Option<usize> {
        self.focused.then(|| self.list.cursor())
    }

    pub fn reset_cursor(&mut self) {
        self.list.reset();
    }

    pub fn move_cursor(&mut self, delta: isize) {
        self.list.move_cursor(delta);
    }

    pub fn selected_key(&self) -> Option<&'static str> {
        self.list.selected().map(|item| item.key)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.list
            .items()
            .iter()
            .find(|item| item.key == key)
            .map(|item| item.label.as_str())
    }

    pub fn set_label(&mut self, key: &str, label: impl Into<String>) {
        if let Some(item) = self.list.items_mut().iter_mut().find(|item| item.key == key) {
            item.label = label.into();
        }
    }
}
