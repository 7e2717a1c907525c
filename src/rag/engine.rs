use std::sync::Arc;

use super::prompt::{build_context, compose_prompt, DEFAULT_PROMPT};
use super::store::{Passage, VectorCollection};
use crate::core::config::RagConfig;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider, TokenStream};

/// Answer in progress: the passages it is grounded on and the token stream.
pub struct RagAnswer {
    pub prompt: String,
    pub passages: Vec<Passage>,
    pub tokens: TokenStream,
}

/// Retrieve-then-generate pipeline.
pub struct RagEngine {
    collection: Arc<dyn VectorCollection>,
    llm: Arc<dyn LlmProvider>,
    config: RagConfig,
}

impl RagEngine {
    pub fn new(
        collection: Arc<dyn VectorCollection>,
        llm: Arc<dyn LlmProvider>,
        config: RagConfig,
    ) -> Self {
        Self {
            collection,
            llm,
            config,
        }
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, ApiError> {
        let passages = self.collection.query(query, self.config.n_results).await?;
        if passages.is_empty() {
            tracing::warn!("Retrieval returned no passages; answering with empty context");
        } else {
            tracing::debug!("Retrieved {} passages", passages.len());
        }
        Ok(passages)
    }

    /// Builds the prompt for `query`; `template` falls back to [`DEFAULT_PROMPT`].
    pub fn compose(&self, template: Option<&str>, passages: &[Passage], query: &str) -> String {
        let template = template
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_PROMPT);
        compose_prompt(template, &build_context(passages), query)
    }

    pub async fn answer(&self, query: &str, template: Option<&str>) -> Result<RagAnswer, ApiError> {
        let passages = self.retrieve(query).await?;
        let prompt = self.compose(template, &passages, query);

        let request =
            ChatRequest::new(vec![ChatMessage::user(prompt.clone())]).with_config(&self.config);
        tracing::info!(
            "Streaming answer from {} deployment '{}'",
            self.llm.name(),
            self.config.chat_model
        );
        let tokens = self
            .llm
            .stream_chat(request, &self.config.chat_model)
            .await?;

        Ok(RagAnswer {
            prompt,
            passages,
            tokens,
        })
    }
}
