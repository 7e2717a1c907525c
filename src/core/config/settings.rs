use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use super::defaults;

/// Which query handler answers chat messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted model-serving endpoint, one JSON answer per query.
    Agent,
    /// Vector search followed by a streamed chat completion.
    #[default]
    Rag,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Agent => "agent",
            BackendKind::Rag => "rag",
        }
    }
}

/// Typed view of the merged `config.yml` + `secrets.yaml` document.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(flatten)]
    pub secrets: Secrets,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::host")]
    pub host: String,
    #[serde(default = "defaults::port")]
    pub port: u16,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default = "defaults::session_idle_secs")]
    pub session_idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            cors_allowed_origins: Vec::new(),
            session_idle_timeout_secs: defaults::session_idle_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "defaults::title")]
    pub title: String,
    #[serde(default = "defaults::welcome")]
    pub welcome: String,
    #[serde(default = "defaults::stylesheet")]
    pub stylesheet: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: defaults::title(),
            welcome: defaults::welcome(),
            stylesheet: defaults::stylesheet(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "defaults::timeout_secs")]
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "defaults::agent_endpoint")]
    pub endpoint: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::agent_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RagConfig {
    #[serde(default = "defaults::chroma_url")]
    pub chroma_url: String,
    #[serde(default = "defaults::collection")]
    pub collection: String,
    #[serde(default = "defaults::n_results")]
    pub n_results: usize,
    #[serde(default = "defaults::chat_model")]
    pub chat_model: String,
    #[serde(default = "defaults::embedding_model")]
    pub embedding_model: String,
    #[serde(default = "defaults::api_version")]
    pub api_version: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chroma_url: defaults::chroma_url(),
            collection: defaults::collection(),
            n_results: defaults::n_results(),
            chat_model: defaults::chat_model(),
            embedding_model: defaults::embedding_model(),
            api_version: defaults::api_version(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Credentials read from the secrets file. Never printed.
#[derive(Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub password: String,
    #[serde(rename = "DATABRICKS_TOKEN", default)]
    pub databricks_token: Option<String>,
    #[serde(rename = "OPENAI_API_KEY", default)]
    pub openai_api_key: Option<String>,
    #[serde(rename = "AZURE_OPENAI_ENDPOINT", default)]
    pub azure_openai_endpoint: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |present: bool| if present { "****" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("password", &mark(!self.password.is_empty()))
            .field("DATABRICKS_TOKEN", &mark(self.databricks_token.is_some()))
            .field("OPENAI_API_KEY", &mark(self.openai_api_key.is_some()))
            .field("AZURE_OPENAI_ENDPOINT", &self.azure_openai_endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = serde_json::from_value(json!({})).expect("config");

        assert_eq!(config.backend, BackendKind::Rag);
        assert_eq!(config.server.port, defaults::DEFAULT_PORT);
        assert_eq!(config.rag.n_results, 5);
        assert_eq!(config.rag.collection, "landsforsoeg");
        assert_eq!(config.rag.chat_model, "gpt4");
        assert_eq!(config.agent.endpoint, defaults::DEFAULT_AGENT_ENDPOINT);
        assert!(config.secrets.password.is_empty());
    }

    #[test]
    fn secrets_are_read_from_top_level_keys() {
        let config: AppConfig = serde_json::from_value(json!({
            "backend": "agent",
            "password": "pw",
            "DATABRICKS_TOKEN": "dapi-123",
        }))
        .expect("config");

        assert_eq!(config.backend, BackendKind::Agent);
        assert_eq!(config.secrets.password, "pw");
        assert_eq!(config.secrets.databricks_token.as_deref(), Some("dapi-123"));
    }

    #[test]
    fn secrets_debug_redacts_credentials() {
        let secrets = Secrets {
            password: "pw".to_string(),
            databricks_token: Some("dapi-123".to_string()),
            openai_api_key: None,
            azure_openai_endpoint: None,
        };

        let rendered = format!("{:?}", secrets);

        assert!(!rendered.contains("dapi-123"));
        assert!(!rendered.contains("\"pw\""));
    }
}
