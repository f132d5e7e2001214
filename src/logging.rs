//! Diagnostic tracing for the binary.
//!
//! The terminal belongs to the chat UI, so diagnostics go to a file in the
//! platform data directory. Verbosity comes from `L4M_LOG` using the usual
//! `EnvFilter` syntax.

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::io::project_dirs;

pub const LOG_ENV: &str = "L4M_LOG";
const DEFAULT_FILTER: &str = "warn";
const LOG_FILE_NAME: &str = "l4m.log";

pub fn log_file_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_local_dir().join(LOG_FILE_NAME))
}

/// Installs the global subscriber and returns the file it writes to.
pub fn init_tracing() -> Result<Option<PathBuf>, Box<dyn Error>> {
    let Some(path) = log_file_path() else {
        return Ok(None);
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()
        .map_err(|err| err.to_string())?;

    Ok(Some(path))
}
