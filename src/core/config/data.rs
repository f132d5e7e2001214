use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent settings from `config.toml`.
///
/// Every field is optional on disk; the accessors in `defaults.rs` supply the
/// built-in value for anything left unset.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Model used when `--model` is not given (e.g. "gemma3:4b")
    pub default_model: Option<String>,
    /// Base URL of the Ollama server
    pub ollama_url: Option<String>,
    /// Model used to embed retrieval queries
    pub embedding_model: Option<String>,
    /// Base URL of the Chroma server
    pub chroma_url: Option<String>,
    /// Chroma collection holding the documents
    pub collection: Option<String>,
    /// Number of passages to retrieve per query
    pub retrieval_k: Option<usize>,
    pub preprompt_path: Option<PathBuf>,
    /// Start sessions with retrieval enabled
    pub rag: Option<bool>,
}

/// Get a user-friendly display string for a path, using `~` for the home
/// directory on Unix-like systems.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
