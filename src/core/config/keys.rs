use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::config::data::Config;

/// Names accepted by `l4m set` and `l4m unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    DefaultModel,
    OllamaUrl,
    EmbeddingModel,
    ChromaUrl,
    Collection,
    RetrievalK,
    PrepromptPath,
    Rag,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 8] = [
        ConfigKey::DefaultModel,
        ConfigKey::OllamaUrl,
        ConfigKey::EmbeddingModel,
        ConfigKey::ChromaUrl,
        ConfigKey::Collection,
        ConfigKey::RetrievalK,
        ConfigKey::PrepromptPath,
        ConfigKey::Rag,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::DefaultModel => "default-model",
            ConfigKey::OllamaUrl => "ollama-url",
            ConfigKey::EmbeddingModel => "embedding-model",
            ConfigKey::ChromaUrl => "chroma-url",
            ConfigKey::Collection => "collection",
            ConfigKey::RetrievalK => "retrieval-k",
            ConfigKey::PrepromptPath => "preprompt-path",
            ConfigKey::Rag => "rag",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.name() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = ConfigKey::ALL.iter().map(|k| k.name()).collect();
                format!("Unknown config key '{s}'. Available keys: {}", known.join(", "))
            })
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("Expected on/off, got '{other}'")),
    }
}

impl Config {
    pub fn set_value(&mut self, key: ConfigKey, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("A value is required for {key}"));
        }
        match key {
            ConfigKey::DefaultModel => self.default_model = Some(value.to_string()),
            ConfigKey::OllamaUrl => self.ollama_url = Some(value.to_string()),
            ConfigKey::EmbeddingModel => self.embedding_model = Some(value.to_string()),
            ConfigKey::ChromaUrl => self.chroma_url = Some(value.to_string()),
            ConfigKey::Collection => self.collection = Some(value.to_string()),
            ConfigKey::RetrievalK => {
                let k = value
                    .parse::<usize>()
                    .ok()
                    .filter(|k| *k > 0)
                    .ok_or_else(|| format!("retrieval-k must be a positive integer, got '{value}'"))?;
                self.retrieval_k = Some(k);
            }
            ConfigKey::PrepromptPath => self.preprompt_path = Some(PathBuf::from(value)),
            ConfigKey::Rag => self.rag = Some(parse_bool(value)?),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::DefaultModel => self.default_model = None,
            ConfigKey::OllamaUrl => self.ollama_url = None,
            ConfigKey::EmbeddingModel => self.embedding_model = None,
            ConfigKey::ChromaUrl => self.chroma_url = None,
            ConfigKey::Collection => self.collection = None,
            ConfigKey::RetrievalK => self.retrieval_k = None,
            ConfigKey::PrepromptPath => self.preprompt_path = None,
            ConfigKey::Rag => self.rag = None,
        }
    }
}
