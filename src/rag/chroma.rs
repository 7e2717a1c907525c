//! Chroma HTTP client implementing [`VectorCollection`].
//!
//! Query texts are embedded client-side with the configured embedding
//! deployment, the same way the collection was built, then sent as
//! `query_embeddings`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use super::store::{Passage, VectorCollection};
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

pub struct ChromaCollection {
    base_url: String,
    name: String,
    collection_id: OnceCell<String>,
    embedder: Arc<dyn LlmProvider>,
    embedding_model: String,
    client: Client,
}

impl ChromaCollection {
    pub fn new(
        base_url: String,
        name: String,
        embedder: Arc<dyn LlmProvider>,
        embedding_model: String,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            name,
            collection_id: OnceCell::new(),
            embedder,
            embedding_model,
            client,
        })
    }

    /// Looks the collection up by name once and caches its id.
    async fn collection_id(&self) -> Result<&str, ApiError> {
        let id = self
            .collection_id
            .get_or_try_init(|| async {
                let url = format!("{}/api/v1/collections/{}", self.base_url, self.name);
                let res = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(ApiError::upstream_transport)?;
                let status = res.status();
                if !status.is_success() {
                    let text = res.text().await.unwrap_or_default();
                    return Err(ApiError::Upstream {
                        status: status.as_u16(),
                        body: text,
                    });
                }
                let payload: Value = res.json().await.map_err(ApiError::upstream_transport)?;
                let id = payload["id"].as_str().ok_or_else(|| {
                    ApiError::BadGateway(format!("collection '{}' has no id", self.name))
                })?;
                tracing::info!("Resolved Chroma collection '{}' to {}", self.name, id);
                Ok(id.to_string())
            })
            .await?;
        Ok(id.as_str())
    }
}

#[async_trait]
impl VectorCollection for ChromaCollection {
    async fn query(&self, query_text: &str, n_results: usize) -> Result<Vec<Passage>, ApiError> {
        let embeddings = self
            .embedder
            .embed(&[query_text.to_string()], &self.embedding_model)
            .await?;
        let query_embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::BadGateway("empty embedding response".to_string()))?;

        let collection_id = self.collection_id().await?;
        let url = format!("{}/api/v1/collections/{}/query", self.base_url, collection_id);
        let body = json!({
            "query_embeddings": [query_embedding],
            "n_results": n_results,
            "include": ["documents", "metadatas"],
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream_transport)?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: Value = res.json().await.map_err(ApiError::upstream_transport)?;
        parse_query_response(&payload)
    }
}

/// Zips the first query's `documents` and `metadatas` lists into passages.
fn parse_query_response(payload: &Value) -> Result<Vec<Passage>, ApiError> {
    let documents = payload["documents"][0].as_array().ok_or_else(|| {
        ApiError::BadGateway("query response missing documents".to_string())
    })?;
    let metadatas = payload["metadatas"][0].as_array().ok_or_else(|| {
        ApiError::BadGateway("query response missing metadatas".to_string())
    })?;

    if documents.len() != metadatas.len() {
        return Err(ApiError::BadGateway(format!(
            "query response has {} documents but {} metadatas",
            documents.len(),
            metadatas.len()
        )));
    }

    documents
        .iter()
        .zip(metadatas.iter())
        .map(|(document, metadata)| {
            let text = document
                .as_str()
                .ok_or_else(|| ApiError::BadGateway("document is not a string".to_string()))?;
            Ok(Passage::new(
                text,
                metadata_field(metadata, "file_name")?,
                metadata_field(metadata, "page_label")?,
            ))
        })
        .collect()
}

/// Metadata values may be stored as strings or numbers; both render as text.
fn metadata_field(metadata: &Value, key: &str) -> Result<String, ApiError> {
    match metadata.get(key) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::Bool(flag)) => Ok(flag.to_string()),
        _ => Err(ApiError::BadGateway(format!(
            "passage metadata missing '{}'",
            key
        ))),
    }
}
