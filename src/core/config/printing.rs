use crate::core::config::data::{path_display, Config};
use crate::core::config::keys::ConfigKey;

impl Config {
    /// Effective value of a key, marking built-in defaults.
    pub fn describe(&self, key: ConfigKey) -> String {
        let (value, is_set) = match key {
            ConfigKey::DefaultModel => (self.default_model().to_string(), self.default_model.is_some()),
            ConfigKey::OllamaUrl => (self.ollama_url().to_string(), self.ollama_url.is_some()),
            ConfigKey::EmbeddingModel => (
                self.embedding_model().to_string(),
                self.embedding_model.is_some(),
            ),
            ConfigKey::ChromaUrl => (self.chroma_url().to_string(), self.chroma_url.is_some()),
            ConfigKey::Collection => (self.collection().to_string(), self.collection.is_some()),
            ConfigKey::RetrievalK => (self.retrieval_k().to_string(), self.retrieval_k.is_some()),
            ConfigKey::PrepromptPath => (
                path_display(self.preprompt_path()),
                self.preprompt_path.is_some(),
            ),
            ConfigKey::Rag => (
                if self.rag_enabled() { "on" } else { "off" }.to_string(),
                self.rag.is_some(),
            ),
        };
        if is_set {
            value
        } else {
            format!("{value} (default)")
        }
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        for key in ConfigKey::ALL {
            println!("  {}: {}", key.name(), self.describe(key));
        }
    }
}
