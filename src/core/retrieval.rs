//! Retrieval-augmented prompts backed by a Chroma collection.
//!
//! Passages are ranked by the vector store; this module only embeds the
//! query, asks for the top `k` documents and stitches them into a prompt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::ollama::OllamaClient;
use crate::core::backend::{BackendError, Retriever};
use crate::utils::url::construct_api_url;

/// Prompt sent to the model when retrieval is active.
pub fn build_rag_prompt(passages: &[String], query: &str) -> String {
    format!("Context:\n{}\n\nQuestion: {}", passages.join("\n"), query)
}

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query_embeddings: Vec<&'a [f32]>,
    n_results: usize,
    include: [&'static str; 1],
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<Vec<Option<String>>>,
}

pub struct ChromaRetriever {
    ollama: OllamaClient,
    embedding_model: String,
    chroma_url: String,
    collection: String,
}

impl ChromaRetriever {
    pub fn new(
        ollama: OllamaClient,
        embedding_model: impl Into<String>,
        chroma_url: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            ollama,
            embedding_model: embedding_model.into(),
            chroma_url: chroma_url.into(),
            collection: collection.into(),
        }
    }

    async fn collection_id(&self) -> Result<String, BackendError> {
        let url = construct_api_url(
            &self.chroma_url,
            &format!("api/v1/collections/{}", self.collection),
        );
        let response = self.ollama.http().get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::from_status(status, &body));
        }
        Ok(response.json::<CollectionInfo>().await?.id)
    }
}

#[async_trait]
impl Retriever for ChromaRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, BackendError> {
        let embedding = self.ollama.embed(&self.embedding_model, query).await?;
        let collection_id = self.collection_id().await?;
        debug!(collection = %self.collection, k, "querying vector store");

        let url = construct_api_url(
            &self.chroma_url,
            &format!("api/v1/collections/{collection_id}/query"),
        );
        let request = QueryRequest {
            query_embeddings: vec![embedding.as_slice()],
            n_results: k,
            include: ["documents"],
        };
        let response = self.ollama.http().post(url).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::from_status(status, &body));
        }

        let payload = response.json::<QueryResponse>().await?;
        Ok(first_result_documents(payload))
    }
}

fn first_result_documents(payload: QueryResponse) -> Vec<String> {
    payload
        .documents
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rag_prompt_joins_passages_before_the_question() {
        let passages = vec!["Rust is a language.".to_string(), "Crabs.".to_string()];
        assert_eq!(
            build_rag_prompt(&passages, "What is Rust?"),
            "Context:\nRust is a language.\nCrabs.\n\nQuestion: What is Rust?"
        );
    }

    #[test]
    fn query_documents_keep_rank_order_and_skip_nulls() {
        let payload: QueryResponse = serde_json::from_str(
            r#"{"ids":[["a","b","c"]],"documents":[["first",null,"third"]]}"#,
        )
        .expect("payload");
        assert_eq!(first_result_documents(payload), vec!["first", "third"]);
    }

    #[test]
    fn empty_query_results_yield_no_passages() {
        let payload: QueryResponse = serde_json::from_str(r#"{"documents":[]}"#).expect("payload");
        assert!(first_result_documents(payload).is_empty());
    }
}
