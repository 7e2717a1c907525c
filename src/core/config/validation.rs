use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    let backend = match root.get("backend") {
        None => "rag",
        Some(Value::String(name)) => name.as_str(),
        Some(_) => return Err(config_type_error("backend", "string")),
    };
    if backend != "agent" && backend != "rag" {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at 'backend': unknown backend '{}', expected 'agent' or 'rag'",
            backend
        )));
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
        validate_u64_field(
            server,
            "server.session_idle_timeout_secs",
            "session_idle_timeout_secs",
            60,
            60 * 60 * 24 * 30,
        )?;
    }

    if let Some(ui) = expect_optional_object(root, "ui")? {
        validate_optional_string_field(ui, "ui.title", "title")?;
        validate_optional_string_field(ui, "ui.welcome", "welcome")?;
        validate_optional_string_field(ui, "ui.stylesheet", "stylesheet")?;
    }

    if let Some(upstream) = expect_optional_object(root, "upstream")? {
        validate_u64_field(upstream, "upstream.timeout_secs", "timeout_secs", 1, 3_600)?;
    }

    if let Some(agent) = expect_optional_object(root, "agent")? {
        validate_url_field(agent, "agent.endpoint", "endpoint")?;
    }

    if let Some(rag) = expect_optional_object(root, "rag")? {
        validate_url_field(rag, "rag.chroma_url", "chroma_url")?;
        validate_optional_string_field(rag, "rag.collection", "collection")?;
        validate_u64_field(rag, "rag.n_results", "n_results", 1, 100)?;
        validate_optional_string_field(rag, "rag.chat_model", "chat_model")?;
        validate_optional_string_field(rag, "rag.embedding_model", "embedding_model")?;
        validate_optional_string_field(rag, "rag.api_version", "api_version")?;
        validate_u64_field(rag, "rag.max_tokens", "max_tokens", 1, 1_000_000)?;
        if let Some(value) = rag.get("temperature") {
            let in_range = value.as_f64().map(|t| (0.0..=2.0).contains(&t));
            if in_range != Some(true) {
                return Err(ApiError::BadRequest(
                    "Invalid config at 'rag.temperature': must be a number between 0 and 2"
                        .to_string(),
                ));
            }
        }
    }

    validate_required_string_field(root, "password", "password")?;
    match backend {
        "agent" => {
            validate_required_string_field(root, "DATABRICKS_TOKEN", "DATABRICKS_TOKEN")?;
        }
        _ => {
            validate_required_string_field(root, "OPENAI_API_KEY", "OPENAI_API_KEY")?;
            validate_required_string_field(
                root,
                "AZURE_OPENAI_ENDPOINT",
                "AZURE_OPENAI_ENDPOINT",
            )?;
            validate_url_field(root, "AZURE_OPENAI_ENDPOINT", "AZURE_OPENAI_ENDPOINT")?;
        }
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_required_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let value = section.get(key).ok_or_else(|| {
        ApiError::BadRequest(format!("Invalid config at '{}': value is required", path))
    })?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_url_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    validate_optional_string_field(section, path, key)?;
    let Some(text) = section.get(key).and_then(|v| v.as_str()) else {
        return Ok(());
    };
    if reqwest::Url::parse(text).is_err() {
        return Err(config_type_error(path, "absolute URL"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rag_config() -> Value {
        json!({
            "password": "pw",
            "OPENAI_API_KEY": "sk",
            "AZURE_OPENAI_ENDPOINT": "https://example.openai.azure.com",
        })
    }

    #[test]
    fn accepts_minimal_rag_config() {
        assert!(validate_config(&rag_config()).is_ok());
    }

    #[test]
    fn agent_backend_requires_databricks_token() {
        let config = json!({ "backend": "agent", "password": "pw" });

        let err = validate_config(&config).expect_err("missing token");

        assert!(err.to_string().contains("DATABRICKS_TOKEN"));
    }

    #[test]
    fn rejects_unknown_backend() {
        let mut config = rag_config();
        config["backend"] = json!("streamlit");

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = rag_config();
        config["rag"] = json!({ "n_results": 0 });
        assert!(validate_config(&config).is_err());

        let mut config = rag_config();
        config["upstream"] = json!({ "timeout_secs": "soon" });
        assert!(validate_config(&config).is_err());

        let mut config = rag_config();
        config["rag"] = json!({ "temperature": 3.5 });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_relative_endpoint_urls() {
        let mut config = rag_config();
        config["AZURE_OPENAI_ENDPOINT"] = json!("not a url");

        assert!(validate_config(&config).is_err());
    }
}
