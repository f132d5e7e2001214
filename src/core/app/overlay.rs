use crate::core::mode::Mode;
use crate::core::selection::SelectableList;

pub const SETTING_CHANGE_PREPROMPT: &str = "Change preprompt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    ModelPicker,
    Settings,
}

impl OverlayKind {
    pub fn mode(self) -> Mode {
        match self {
            OverlayKind::ModelPicker => Mode::ModelPicker,
            OverlayKind::Settings => Mode::Settings,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            OverlayKind::ModelPicker => "Pick a model",
            OverlayKind::Settings => "Settings",
        }
    }
}

/// A modal list that exists only while it is open.
///
/// The cursor clamps at both ends. `return_mode` is the mode that was active
/// when the overlay opened and is restored when it is dismissed.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub kind: OverlayKind,
    pub list: SelectableList<String>,
    pub return_mode: Mode,
    pub loading: bool,
}

impl Overlay {
    /// Opens the picker empty; the model list arrives asynchronously.
    pub fn model_picker(return_mode: Mode) -> Self {
        Self {
            kind: OverlayKind::ModelPicker,
            list: SelectableList::clamped(Vec::new()),
            return_mode,
            loading: true,
        }
    }

    pub fn settings(return_mode: Mode) -> Self {
        Self {
            kind: OverlayKind::Settings,
            list: SelectableList::clamped(vec![SETTING_CHANGE_PREPROMPT.to_string()]),
            return_mode,
            loading: false,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.list.selected().map(String::as_str)
    }

    /// Replaces the items, starting on `current` when it is listed.
    pub fn load_items(&mut self, items: Vec<String>, current: Option<&str>) {
        self.list.set_items(items);
        self.loading = false;
        if let Some(index) = current.and_then(|c| self.list.items().iter().position(|i| i == c)) {
            self.list.select(index);
        }
    }
}
