use std::sync::Arc;

use tokio::sync::mpsc;

use crate::agent::AgentClient;
use crate::core::config::BackendKind;
use crate::core::errors::ApiError;
use crate::llm::TokenStream;
use crate::rag::{Passage, RagEngine};

/// The query handler configured for this deployment.
#[derive(Clone)]
pub enum QueryBackend {
    Agent(AgentClient),
    Rag(Arc<RagEngine>),
}

/// Output of one query: tokens as they arrive, plus the passages the
/// answer was grounded on (always empty for the agent backend).
pub struct QueryAnswer {
    pub tokens: TokenStream,
    pub passages: Vec<Passage>,
}

impl QueryBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            QueryBackend::Agent(_) => BackendKind::Agent,
            QueryBackend::Rag(_) => BackendKind::Rag,
        }
    }

    /// Runs one query. Failures before the first token (upstream status,
    /// retrieval) are returned here; later ones arrive on the stream.
    pub async fn answer(
        &self,
        query: &str,
        prompt_template: Option<&str>,
    ) -> Result<QueryAnswer, ApiError> {
        match self {
            QueryBackend::Agent(client) => {
                let answer = client.ask(query).await?;
                let (tx, rx) = mpsc::channel(1);
                let _ = tx.send(Ok(answer)).await;
                Ok(QueryAnswer {
                    tokens: rx,
                    passages: Vec::new(),
                })
            }
            QueryBackend::Rag(engine) => {
                let answer = engine.answer(query, prompt_template).await?;
                tracing::debug!("Composed prompt of {} chars", answer.prompt.len());
                Ok(QueryAnswer {
                    tokens: answer.tokens,
                    passages: answer.passages,
                })
            }
        }
    }
}
