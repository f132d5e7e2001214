pub mod app;
pub mod backend;
pub mod chat_stream;
pub mod config;
pub mod message;
pub mod mode;
pub mod preprompt;
pub mod render;
pub mod retrieval;
pub mod selection;
pub mod session;
