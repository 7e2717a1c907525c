use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::agent::AgentClient;
use crate::backend::QueryBackend;
use crate::core::config::{AppConfig, AppPaths, BackendKind, ConfigService};
use crate::core::errors::ApiError;
use crate::core::security::SharedPassword;
use crate::llm::{AzureOpenAiProvider, LlmProvider};
use crate::rag::{ChromaCollection, RagEngine};
use crate::session::SessionStore;

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes.
///
/// Contains:
/// - Typed configuration and the shared password
/// - The per-session context store
/// - The configured query backend (hosted agent or RAG pipeline)
/// - The stylesheet inlined into the chat page
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub password: SharedPassword,
    pub sessions: SessionStore,
    pub backend: QueryBackend,
    pub stylesheet: Arc<String>,
}

impl AppState {
    pub fn new(config: AppConfig, backend: QueryBackend) -> Self {
        let password = SharedPassword::new(config.secrets.password.clone());
        Self {
            config: Arc::new(config),
            password,
            sessions: SessionStore::new(),
            backend,
            stylesheet: Arc::new(String::new()),
        }
    }

    pub fn with_stylesheet(mut self, css: String) -> Self {
        self.stylesheet = Arc::new(css);
        self
    }

    /// Initializes the application state.
    ///
    /// 1. Loads and validates `config.yml` merged with `secrets.yaml`
    /// 2. Builds the configured query backend
    /// 3. Reads the stylesheet, if present
    pub fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config_service = ConfigService::new(paths.clone());
        let merged = config_service
            .load_config()
            .map_err(|e| InitializationError::Config(e.into()))?;
        tracing::info!(
            "Effective config: {}",
            config_service.redact_sensitive_values(&merged)
        );
        let config = crate::core::config::parse_config(merged)
            .map_err(|e| InitializationError::Config(e.into()))?;

        let backend = build_backend(&config).map_err(|e| InitializationError::Backend {
            backend: config.backend.as_str(),
            source: e.into(),
        })?;

        let stylesheet_path = paths.resolve(Path::new(&config.ui.stylesheet));
        let stylesheet = load_stylesheet(&stylesheet_path);

        Ok(Arc::new(
            AppState::new(config, backend).with_stylesheet(stylesheet),
        ))
    }
}

fn build_backend(config: &AppConfig) -> Result<QueryBackend, ApiError> {
    let timeout = config.upstream.timeout();
    match config.backend {
        BackendKind::Agent => {
            let token = config.secrets.databricks_token.clone().unwrap_or_default();
            let client = AgentClient::new(config.agent.endpoint.clone(), token, timeout)?;
            tracing::info!("Using hosted agent endpoint {}", client.endpoint());
            Ok(QueryBackend::Agent(client))
        }
        BackendKind::Rag => {
            let endpoint = config
                .secrets
                .azure_openai_endpoint
                .clone()
                .unwrap_or_default();
            let api_key = config.secrets.openai_api_key.clone().unwrap_or_default();
            let llm: Arc<dyn LlmProvider> = Arc::new(AzureOpenAiProvider::new(
                endpoint,
                api_key,
                config.rag.api_version.clone(),
                timeout,
            )?);
            let collection = Arc::new(ChromaCollection::new(
                config.rag.chroma_url.clone(),
                config.rag.collection.clone(),
                llm.clone(),
                config.rag.embedding_model.clone(),
                timeout,
            )?);
            tracing::info!(
                "Using RAG over Chroma collection '{}' at {}",
                config.rag.collection,
                config.rag.chroma_url
            );
            Ok(QueryBackend::Rag(Arc::new(RagEngine::new(
                collection,
                llm,
                config.rag.clone(),
            ))))
        }
    }
}

fn load_stylesheet(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(css) => css,
        Err(err) => {
            tracing::warn!("Stylesheet {} not loaded: {}", path.display(), err);
            String::new()
        }
    }
}
