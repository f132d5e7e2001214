use std::path::Path;

use crate::core::config::data::Config;

pub const DEFAULT_MODEL: &str = "gemma3:4b";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text:latest";
pub const DEFAULT_CHROMA_URL: &str = "http://localhost:8000";
pub const DEFAULT_COLLECTION: &str = "wiki_rag";
pub const DEFAULT_RETRIEVAL_K: usize = 5;
pub const DEFAULT_PREPROMPT_PATH: &str = "preprompt.txt";

impl Config {
    pub fn default_model(&self) -> &str {
        self.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn ollama_url(&self) -> &str {
        self.ollama_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    }

    pub fn embedding_model(&self) -> &str {
        self.embedding_model
            .as_deref()
            .unwrap_or(DEFAULT_EMBEDDING_MODEL)
    }

    pub fn chroma_url(&self) -> &str {
        self.chroma_url.as_deref().unwrap_or(DEFAULT_CHROMA_URL)
    }

    pub fn collection(&self) -> &str {
        self.collection.as_deref().unwrap_or(DEFAULT_COLLECTION)
    }

    pub fn retrieval_k(&self) -> usize {
        self.retrieval_k
            .filter(|k| *k > 0)
            .unwrap_or(DEFAULT_RETRIEVAL_K)
    }

    /// Relative paths resolve against the working directory.
    pub fn preprompt_path(&self) -> &Path {
        self.preprompt_path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PREPROMPT_PATH))
    }

    pub fn rag_enabled(&self) -> bool {
        self.rag.unwrap_or(false)
    }
}
