//! VectorCollection trait — abstract interface over the nearest-neighbor store.
//!
//! The production implementation is `ChromaCollection` in the `chroma`
//! module; tests substitute in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A retrieved text chunk with its source citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    pub file_name: String,
    pub page_label: String,
}

impl Passage {
    pub fn new(
        text: impl Into<String>,
        file_name: impl Into<String>,
        page_label: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            file_name: file_name.into(),
            page_label: page_label.into(),
        }
    }

    /// Passage text followed by its human-readable citation.
    pub fn cited(&self) -> String {
        format!(
            "{} (filename: {}, page_number: {})",
            self.text, self.file_name, self.page_label
        )
    }
}

#[async_trait]
pub trait VectorCollection: Send + Sync {
    /// Returns up to `n_results` passages nearest to `query_text`, closest first.
    async fn query(&self, query_text: &str, n_results: usize) -> Result<Vec<Passage>, ApiError>;
}
