use std::sync::Arc;

use tracing::info;

use super::ChatOptions;
use crate::api::ollama::OllamaClient;
use crate::core::app::{App, AppInitConfig};
use crate::core::backend::{GenerationBackend, ModelLister, Retriever};
use crate::core::config::Config;
use crate::core::preprompt::PrepromptStore;
use crate::core::retrieval::ChromaRetriever;

/// Controller plus the services its commands run against.
pub struct ChatSetup {
    pub app: App,
    pub backend: Arc<dyn GenerationBackend>,
    pub models: Arc<dyn ModelLister>,
    pub retriever: Arc<dyn Retriever>,
}

/// Resolves command-line overrides against the config file and wires the
/// Ollama and vector-store clients.
pub fn bootstrap_app(options: ChatOptions, config: &Config) -> ChatSetup {
    let ChatOptions {
        model,
        log,
        rag,
        ollama_url,
    } = options;

    let model = model.unwrap_or_else(|| config.default_model().to_string());
    let ollama_url = ollama_url.unwrap_or_else(|| config.ollama_url().to_string());
    let rag_enabled = rag.unwrap_or_else(|| config.rag_enabled());
    info!(%model, %ollama_url, rag_enabled, "starting chat session");

    let client = OllamaClient::new(ollama_url);
    let retriever = ChromaRetriever::new(
        client.clone(),
        config.embedding_model(),
        config.chroma_url(),
        config.collection(),
    );

    let app = App::new(AppInitConfig {
        model,
        rag_enabled,
        retrieval_k: config.retrieval_k(),
        preprompt: PrepromptStore::new(config.preprompt_path()),
        log_file: log,
    });

    let client = Arc::new(client);
    ChatSetup {
        app,
        backend: client.clone(),
        models: client,
        retriever: Arc::new(retriever),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mode::Mode;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config {
            default_model: Some("llama3.2".into()),
            rag: Some(true),
            retrieval_k: Some(3),
            preprompt_path: Some(dir.path().join("preprompt.txt")),
            ..Default::default()
        }
    }

    #[test]
    fn config_values_seed_the_session() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("preprompt.txt"), "Be brief.\n").expect("write");

        let setup = bootstrap_app(ChatOptions::default(), &config_in(&dir));
        let app = setup.app;
        assert_eq!(app.session.model(), "llama3.2");
        assert_eq!(app.session.preprompt(), Some("Be brief.\n"));
        assert!(app.rag.enabled);
        assert_eq!(app.rag.k, 3);
        assert_eq!(app.mode, Mode::Typing);
    }

    #[test]
    fn command_line_overrides_win() {
        let dir = TempDir::new().expect("tempdir");
        let options = ChatOptions {
            model: Some("qwen2.5".into()),
            rag: Some(false),
            ..Default::default()
        };
        let app = bootstrap_app(options, &config_in(&dir)).app;
        assert_eq!(app.session.model(), "qwen2.5");
        assert!(!app.rag.enabled);
        assert_eq!(app.sidebar.items()[1].label, "RAG: off");
    }
}
