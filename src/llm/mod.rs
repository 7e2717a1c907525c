pub mod azure_openai;
pub mod provider;
pub mod types;

pub use azure_openai::AzureOpenAiProvider;
pub use provider::{LlmProvider, TokenStream};
pub use types::{ChatMessage, ChatRequest};
