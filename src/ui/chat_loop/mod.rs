//! Main chat event loop and terminal lifecycle.
//!
//! [`run_chat`] builds the session from configuration, takes over the
//! terminal, and drives the loop until the user quits.

mod event_loop;
mod lifecycle;
mod setup;


pub use event_loop::run_chat;
pub use setup::{bootstrap_app, ChatSetup};

/// Command-line overrides for one interactive session.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub log: Option<String>,
    pub rag: Option<bool>,
    pub ollama_url: Option<String>,
}
