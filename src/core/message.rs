use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TranscriptRole {
    User,
    Assistant,
    System,
    AppInfo,
    AppError,
}

/// Lifecycle of a transcript entry.
///
/// Assistant placeholders start out `Streaming` and are the only entries that
/// accept appended text. Every other entry is created frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageState {
    Streaming,
    #[default]
    Complete,
    /// Frozen after the backend failed or the stream was cancelled.
    Incomplete,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: TranscriptRole,
    pub content: String,
    pub state: MessageState,
}

impl TranscriptRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TranscriptRole::User => "user",
            TranscriptRole::Assistant => "assistant",
            TranscriptRole::System => "system",
            TranscriptRole::AppInfo => "app/info",
            TranscriptRole::AppError => "app/error",
        }
    }

    /// Role name sent to the backend, or `None` for transcript-only notices.
    pub fn to_api_role(self) -> Option<&'static str> {
        match self {
            TranscriptRole::User => Some("user"),
            TranscriptRole::Assistant => Some("assistant"),
            TranscriptRole::System => Some("system"),
            _ => None,
        }
    }

    pub fn is_app(self) -> bool {
        matches!(self, TranscriptRole::AppInfo | TranscriptRole::AppError)
    }
}

impl TryFrom<&str> for TranscriptRole {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(TranscriptRole::User),
            "assistant" => Ok(TranscriptRole::Assistant),
            "system" => Ok(TranscriptRole::System),
            "app/info" => Ok(TranscriptRole::AppInfo),
            "app/error" => Ok(TranscriptRole::AppError),
            _ => Err(format!("invalid transcript role: {value}")),
        }
    }
}

impl TryFrom<String> for TranscriptRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<TranscriptRole> for String {
    fn from(value: TranscriptRole) -> Self {
        value.as_str().to_string()
    }
}

/// Severity for app-authored notices rendered in the transcript but never
/// transmitted to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppMessageKind {
    Info,
    Error,
}

impl AppMessageKind {
    pub fn as_role(self) -> TranscriptRole {
        match self {
            AppMessageKind::Info => TranscriptRole::AppInfo,
            AppMessageKind::Error => TranscriptRole::AppError,
        }
    }
}

impl Message {
    pub fn new(role: TranscriptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            state: MessageState::Complete,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::User, content)
    }

    /// Empty assistant entry that receives streamed text.
    pub fn assistant_placeholder() -> Self {
        Self {
            role: TranscriptRole::Assistant,
            content: String::new(),
            state: MessageState::Streaming,
        }
    }

    pub fn app(kind: AppMessageKind, content: impl Into<String>) -> Self {
        Self::new(kind.as_role(), content)
    }

    pub fn is_user(&self) -> bool {
        self.role == TranscriptRole::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == TranscriptRole::Assistant
    }

    pub fn is_streaming(&self) -> bool {
        self.state == MessageState::Streaming
    }

    pub fn is_incomplete(&self) -> bool {
        self.state == MessageState::Incomplete
    }
}
