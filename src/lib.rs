pub mod agent;
pub mod backend;
pub mod core;
pub mod llm;
pub mod rag;
pub mod server;
pub mod session;
pub mod state;
