//! Client for the hosted model-serving ("agent") endpoint.
//!
//! The endpoint accepts a chat-style payload and answers with a single
//! completion:
//!
//! ```text
//! POST <endpoint>
//! Authorization: Bearer <DATABRICKS_TOKEN>
//! {"messages": [{"role": "user", "content": "<query>"}]}
//!
//! 200 {"choices": [{"message": {"content": "<answer>"}}]}
//! ```

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::llm::ChatMessage;

#[derive(Clone)]
pub struct AgentClient {
    endpoint: String,
    token: String,
    client: Client,
}

impl AgentClient {
    pub fn new(endpoint: String, token: String, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            endpoint,
            token,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends `query` as a single user message and returns the first
    /// choice's content verbatim. No retries.
    pub async fn ask(&self, query: &str) -> Result<String, ApiError> {
        let body = json!({
            "messages": [ChatMessage::user(query)],
        });

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream_transport)?;

        let status = res.status();
        if status != StatusCode::OK {
            let text = res.text().await.unwrap_or_default();
            tracing::warn!("Agent endpoint answered with status {}", status.as_u16());
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: Value = res.json().await.map_err(ApiError::upstream_transport)?;
        extract_answer(&payload)
    }
}

fn extract_answer(payload: &Value) -> Result<String, ApiError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.to_string())
        .ok_or_else(|| {
            ApiError::BadGateway(
                "agent response missing choices[0].message.content".to_string(),
            )
        })
}
