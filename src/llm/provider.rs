use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::errors::ApiError;
use super::types::ChatRequest;

/// Stream of completion tokens; an `Err` item ends the stream.
pub type TokenStream = mpsc::Receiver<Result<String, ApiError>>;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "azure_openai")
    fn name(&self) -> &str;

    /// chat completion (streaming)
    async fn stream_chat(
        &self,
        request: ChatRequest,
        model_id: &str,
    ) -> Result<TokenStream, ApiError>;

    /// generate embeddings
    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError>;
}
