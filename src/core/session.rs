use crate::api::ChatMessage;
use crate::core::message::{AppMessageKind, Message, MessageState};

/// Everything the coordinator needs to start generating a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Trimmed user text as typed.
    pub prompt: String,
    /// Ordered history including the new user turn.
    pub history: Vec<ChatMessage>,
    pub model: String,
    /// Transcript index of the assistant placeholder.
    pub assistant_index: usize,
}

/// Conversation state owned by the controller.
///
/// `messages` is what the transcript shows, `history` is what the backend
/// receives. Both are append-only apart from [`ChatSession::clear`] and the
/// removal of an assistant placeholder that never received text.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<Message>,
    history: Vec<ChatMessage>,
    model: String,
}

impl ChatSession {
    pub fn new(model: impl Into<String>, preprompt: Option<String>) -> Self {
        let mut session = Self {
            messages: Vec::new(),
            history: Vec::new(),
            model: model.into(),
        };
        session.set_preprompt(preprompt);
        session
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn preprompt(&self) -> Option<&str> {
        self.history
            .first()
            .filter(|entry| entry.role == "system")
            .map(|entry| entry.content.as_str())
    }

    /// Installs, replaces or removes the leading system message.
    pub fn set_preprompt(&mut self, preprompt: Option<String>) {
        let has_system = self.preprompt().is_some();
        match (preprompt.filter(|text| !text.trim().is_empty()), has_system) {
            (Some(text), true) => self.history[0].content = text,
            (Some(text), false) => self.history.insert(0, ChatMessage::system(text)),
            (None, true) => {
                self.history.remove(0);
            }
            (None, false) => {}
        }
    }

    /// Records a user turn and an empty assistant placeholder.
    ///
    /// Returns `None` without touching any state when the trimmed text is
    /// empty.
    pub fn submit(&mut self, text: &str) -> Option<Submission> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return None;
        }

        self.messages.push(Message::user(prompt));
        self.history.push(ChatMessage::user(prompt));
        self.messages.push(Message::assistant_placeholder());

        Some(Submission {
            prompt: prompt.to_string(),
            history: self.history.clone(),
            model: self.model.clone(),
            assistant_index: self.messages.len() - 1,
        })
    }

    /// Appends streamed text to a placeholder. Frozen messages are left alone.
    pub fn append_to_message(&mut self, index: usize, text: &str) -> bool {
        match self.messages.get_mut(index) {
            Some(message) if message.is_streaming() => {
                message.content.push_str(text);
                true
            }
            _ => false,
        }
    }

    pub fn message_text(&self, index: usize) -> Option<&str> {
        self.messages.get(index).map(|m| m.content.as_str())
    }

    /// Freezes a placeholder in its final state.
    pub fn finalize_message(&mut self, index: usize, state: MessageState) {
        if let Some(message) = self.messages.get_mut(index) {
            if message.is_streaming() {
                message.state = state;
            }
        }
    }

    pub fn record_assistant_turn(&mut self, text: impl Into<String>) {
        self.history.push(ChatMessage::assistant(text));
    }

    /// Rewrites the most recent user history entry, e.g. with retrieved
    /// context. The transcript keeps the text as typed.
    pub fn replace_last_user_turn(&mut self, content: impl Into<String>) -> bool {
        match self.history.iter_mut().rev().find(|entry| entry.role == "user") {
            Some(entry) => {
                entry.content = content.into();
                true
            }
            None => false,
        }
    }

    /// Drops a placeholder that never received text.
    pub fn remove_empty_placeholder(&mut self, index: usize) -> bool {
        let removable = self
            .messages
            .get(index)
            .is_some_and(|m| m.is_assistant() && m.content.is_empty() && index + 1 == self.messages.len());
        if removable {
            self.messages.remove(index);
        }
        removable
    }

    pub fn add_app_message(&mut self, kind: AppMessageKind, content: impl Into<String>) -> usize {
        self.messages.push(Message::app(kind, content));
        self.messages.len() - 1
    }

    /// Clears the transcript and history, keeping the preprompt.
    pub fn clear(&mut self) {
        self.messages.clear();
        let preprompt = self.preprompt().map(str::to_string);
        self.history.clear();
        self.set_preprompt(preprompt);
    }
}
