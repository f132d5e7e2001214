//! Cursor-addressed lists shared by the sidebar and the overlays.

/// How the cursor behaves when it is moved past either end of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPolicy {
    /// Index is taken modulo the length.
    Wrap,
    /// Index is bounded to `[0, len - 1]`.
    Clamp,
}

#[derive(Debug, Clone)]
pub struct SelectableList<T> {
    items: Vec<T>,
    cursor: usize,
    policy: CursorPolicy,
}

impl<T> SelectableList<T> {
    pub fn new(items: Vec<T>, policy: CursorPolicy) -> Self {
        Self {
            items,
            cursor: 0,
            policy,
        }
    }

    pub fn wrapping(items: Vec<T>) -> Self {
        Self::new(items, CursorPolicy::Wrap)
    }

    pub fn clamped(items: Vec<T>) -> Self {
        Self::new(items, CursorPolicy::Clamp)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.cursor)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.items.is_empty() {
            self.cursor = 0;
            return;
        }

        let len = self.items.len() as isize;
        let target = self.cursor as isize + delta;
        self.cursor = match self.policy {
            CursorPolicy::Wrap => target.rem_euclid(len) as usize,
            CursorPolicy::Clamp => target.clamp(0, len - 1) as usize,
        };
    }

    pub fn move_up(&mut self) {
        self.move_cursor(-1);
    }

    pub fn move_down(&mut self) {
        self.move_cursor(1);
    }

    /// Places the cursor on `index`, bounded to the list.
    pub fn select(&mut self, index: usize) {
        self.cursor = index;
        self.clamp_cursor();
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
    }
}

impl<T: PartialEq> SelectableList<T> {
    pub fn position(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|candidate| candidate == item)
    }
}
