use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::AppConfig;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 10] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "access_key",
    "access_token",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "total_tokens", "tokens"];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// Public config with the secrets file merged on top.
    pub fn load_config(&self) -> Result<Value, ApiError> {
        let public_config = load_yaml_file(&self.paths.config_path)?;
        let secrets_config = load_yaml_file(&self.paths.secrets_path)?;
        Ok(deep_merge(&public_config, &secrets_config))
    }

    /// Loads, validates and deserializes the merged config.
    pub fn load_typed(&self) -> Result<AppConfig, ApiError> {
        let merged = self.load_config()?;
        parse_config(merged)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

pub fn parse_config(merged: Value) -> Result<AppConfig, ApiError> {
    validate_config(&merged)?;
    serde_json::from_value(merged)
        .map_err(|e| ApiError::BadRequest(format!("Invalid config: {}", e)))
}

fn load_yaml_file(path: &Path) -> Result<Value, ApiError> {
    if !path.exists() {
        tracing::debug!("Config file {} not found, skipping", path.display());
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ApiError::internal(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let value = serde_yaml::from_str::<Value>(&contents).map_err(|e| {
        ApiError::BadRequest(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(ApiError::BadRequest(format!(
            "Invalid config in {}: expected a mapping at the top level",
            path.display()
        ))),
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths_in(dir: &Path) -> AppPaths {
        AppPaths {
            project_root: dir.to_path_buf(),
            log_dir: dir.join("logs"),
            config_path: dir.join("config.yml"),
            secrets_path: dir.join("secrets.yaml"),
        }
    }

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "a": 1,
            "b": { "c": 2, "d": 3 },
            "arr": [1, 2]
        });
        let override_value = json!({
            "b": { "c": 99 },
            "arr": [3],
            "e": "x"
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "a": 1,
                "b": { "c": 99, "d": 3 },
                "arr": [3],
                "e": "x"
            })
        );
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "password": "pw",
            "DATABRICKS_TOKEN": "dapi",
            "OPENAI_API_KEY": "sk",
            "rag": {
                "max_tokens": 42,
                "collection": "landsforsoeg"
            }
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "password": "****",
                "DATABRICKS_TOKEN": "****",
                "OPENAI_API_KEY": "****",
                "rag": {
                    "max_tokens": 42,
                    "collection": "landsforsoeg"
                }
            })
        );
    }

    #[test]
    fn load_typed_merges_secrets_file_over_public_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("config.yml"),
            "backend: agent\nserver:\n  port: 9000\nagent:\n  endpoint: http://127.0.0.1:1/invocations\n",
        )
        .expect("write config");
        fs::write(
            dir.path().join("secrets.yaml"),
            "password: hemmelig\nDATABRICKS_TOKEN: dapi-abc\n",
        )
        .expect("write secrets");

        let service = ConfigService::new(Arc::new(paths_in(dir.path())));
        let config = service.load_typed().expect("config");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.agent.endpoint, "http://127.0.0.1:1/invocations");
        assert_eq!(config.secrets.password, "hemmelig");
        assert_eq!(config.secrets.databricks_token.as_deref(), Some("dapi-abc"));
    }

    #[test]
    fn load_typed_rejects_missing_password() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("config.yml"), "backend: agent\n").expect("write config");

        let service = ConfigService::new(Arc::new(paths_in(dir.path())));

        assert!(matches!(service.load_typed(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn load_config_rejects_non_mapping_yaml() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("config.yml"), "- just\n- a list\n").expect("write config");

        let service = ConfigService::new(Arc::new(paths_in(dir.path())));

        assert!(service.load_config().is_err());
    }
}
