//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `VectorCollection`: nearest-neighbor lookup of cited passages
//! - `ChromaCollection`: the Chroma HTTP implementation
//! - `RagEngine`: retrieval, prompt assembly and streamed completion

mod chroma;
mod engine;
pub mod prompt;
mod store;

pub use chroma::ChromaCollection;
pub use engine::{RagAnswer, RagEngine};
pub use prompt::{DEFAULT_PROMPT, END_OF_PROMPT};
pub use store::{Passage, VectorCollection};
