use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::provider::{LlmProvider, TokenStream};
use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// Chat completions and embeddings against an Azure OpenAI resource.
///
/// Deployments are addressed by name (`model_id`), e.g. `gpt4` or
/// `text-embedding-ada-002`.
#[derive(Clone)]
pub struct AzureOpenAiProvider {
    endpoint: String,
    api_key: String,
    api_version: String,
    timeout: Duration,
    client: Client,
}

impl AzureOpenAiProvider {
    pub fn new(
        endpoint: String,
        api_key: String,
        api_version: String,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            api_version,
            timeout,
            client,
        })
    }

    fn deployment_url(&self, model_id: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint, model_id, operation, self.api_version
        )
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAiProvider {
    fn name(&self) -> &str {
        "azure_openai"
    }

    async fn stream_chat(
        &self,
        request: ChatRequest,
        model_id: &str,
    ) -> Result<TokenStream, ApiError> {
        let url = self.deployment_url(model_id, "chat/completions");

        let mut body = json!({
            "messages": request.messages,
            "stream": true,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
        }

        let send = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send();
        let res = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| ApiError::BadGateway("chat completion request timed out".to_string()))?
            .map_err(ApiError::upstream_transport)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let (tx, rx) = mpsc::channel(32);
        let mut stream = res.bytes_stream();
        let idle_timeout = self.timeout;

        tokio::spawn(async move {
            let mut buffer: Vec<u8> = Vec::new();
            loop {
                let next = match tokio::time::timeout(idle_timeout, stream.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        let _ = tx
                            .send(Err(ApiError::BadGateway(
                                "chat completion stream stalled".to_string(),
                            )))
                            .await;
                        return;
                    }
                };
                let Some(item) = next else {
                    break;
                };
                match item {
                    Ok(bytes) => {
                        buffer.extend_from_slice(&bytes);
                        for line in drain_lines(&mut buffer) {
                            match parse_stream_line(&line) {
                                StreamLine::Done => return,
                                StreamLine::Token(content) => {
                                    if tx.send(Ok(content)).await.is_err() {
                                        return;
                                    }
                                }
                                StreamLine::Skip => {}
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(ApiError::upstream_transport(e))).await;
                        return;
                    }
                }
            }

            // A final event may arrive without a trailing newline.
            if !buffer.is_empty() {
                let line = String::from_utf8_lossy(&buffer).trim().to_string();
                if let StreamLine::Token(content) = parse_stream_line(&line) {
                    let _ = tx.send(Ok(content)).await;
                }
            }
        });

        Ok(rx)
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        let url = self.deployment_url(model_id, "embeddings");

        let body = json!({
            "input": inputs,
        });

        let res = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream_transport)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: Value = res.json().await.map_err(ApiError::upstream_transport)?;
        let embeddings = parse_embeddings(&payload)?;
        if embeddings.len() != inputs.len() {
            return Err(ApiError::BadGateway(format!(
                "embedding response has {} vectors for {} inputs",
                embeddings.len(),
                inputs.len()
            )));
        }

        Ok(embeddings)
    }
}

#[derive(Debug, PartialEq)]
enum StreamLine {
    Token(String),
    Done,
    Skip,
}

/// Splits complete `\n`-terminated lines off the front of `buffer`.
///
/// Works on bytes so a multi-byte character split across network chunks is
/// only decoded once both halves have arrived.
fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=pos).collect();
        lines.push(String::from_utf8_lossy(&line).trim().to_string());
    }
    lines
}

fn parse_stream_line(line: &str) -> StreamLine {
    let Some(data) = line.strip_prefix("data:") else {
        return StreamLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return StreamLine::Done;
    }

    let Ok(json) = serde_json::from_str::<Value>(data) else {
        return StreamLine::Skip;
    };
    match json["choices"][0]["delta"]["content"].as_str() {
        Some(content) if !content.is_empty() => StreamLine::Token(content.to_string()),
        _ => StreamLine::Skip,
    }
}

fn parse_embeddings(payload: &Value) -> Result<Vec<Vec<f32>>, ApiError> {
    let data = payload["data"]
        .as_array()
        .ok_or_else(|| ApiError::BadGateway("embedding response missing data array".to_string()))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let values = item["embedding"].as_array().ok_or_else(|| {
            ApiError::BadGateway("embedding response item missing embedding".to_string())
        })?;
        let vector = values
            .iter()
            .map(|v| {
                v.as_f64().map(|f| f as f32).ok_or_else(|| {
                    ApiError::BadGateway(format!("embedding component is not a number: {}", v))
                })
            })
            .collect::<Result<Vec<f32>, ApiError>>()?;
        let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(position);
        indexed.push((index, vector));
    }
    indexed.sort_by_key(|(index, _)| *index);

    Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
}
