//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: terminal setup, the event loop, and the glue that turns
//!   [`crate::core::app::AppCommand`] values into background tasks.
//! - [`renderer`]: frame composition from the current [`crate::core::app::App`].
//! - [`sink`]: the [`crate::core::render::RenderSink`] that schedules redraws.
//!
//! Ownership boundary: this layer presents and captures interaction state, while
//! [`crate::core`] owns domain logic and backend coordination.

pub mod chat_loop;
pub mod renderer;
pub mod sink;
