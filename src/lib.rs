//! l4m is a terminal chat client for language models served by a local
//! Ollama instance, with optional retrieval-augmented prompts.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the session controller: input modes, the chat session,
//!   selectable lists and overlays, and streaming orchestration.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`commands`] implements slash-command parsing for the input box.
//! - [`api`] defines the Ollama wire payloads and the HTTP client.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which loads configuration and dispatches into
//! [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
