//! User action dispatch.
//!
//! Every interaction on the chat page is posted as one [`UserAction`] to
//! `POST /api/sessions/:session_id/actions` and routed to its handler here.
//! Queries answer with a server-sent-events stream; all other actions answer
//! with the updated session view.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::backend::QueryAnswer;
use crate::core::config::BackendKind;
use crate::core::errors::ApiError;
use crate::server::handlers::sessions::SessionView;
use crate::state::AppState;

const SSE_BUFFER: usize = 32;
const SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserAction {
    SubmitPassword { password: String },
    SubmitQuery { query: String },
    ResetTranscript,
    UpdatePrompt {
        #[serde(default)]
        template: Option<String>,
    },
}

impl UserAction {
    fn name(&self) -> &'static str {
        match self {
            UserAction::SubmitPassword { .. } => "submit_password",
            UserAction::SubmitQuery { .. } => "submit_query",
            UserAction::ResetTranscript => "reset_transcript",
            UserAction::UpdatePrompt { .. } => "update_prompt",
        }
    }
}

pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(action): Json<UserAction>,
) -> Result<Response, ApiError> {
    tracing::debug!(session = %session_id, action = action.name(), "Dispatching action");

    match action {
        UserAction::SubmitPassword { password } => {
            state
                .sessions
                .update(&session_id, |session| {
                    session.authenticate(password, &state.password)
                })??;
            session_response(&state, &session_id)
        }
        UserAction::SubmitQuery { query } => submit_query(state, session_id, query).await,
        UserAction::ResetTranscript => {
            state.sessions.update(&session_id, |session| {
                session.require_authenticated()?;
                session.reset_transcript();
                Ok::<_, ApiError>(())
            })??;
            tracing::info!(session = %session_id, "Transcript reset");
            session_response(&state, &session_id)
        }
        UserAction::UpdatePrompt { template } => {
            if state.backend.kind() != BackendKind::Rag {
                state
                    .sessions
                    .get(&session_id)?
                    .require_authenticated()?;
                return Err(ApiError::BadRequest(
                    "Prompt templates are only available for the rag backend".to_string(),
                ));
            }
            state.sessions.update(&session_id, |session| {
                session.require_authenticated()?;
                session.set_prompt_template(template);
                Ok::<_, ApiError>(())
            })??;
            session_response(&state, &session_id)
        }
    }
}

fn session_response(state: &AppState, session_id: &str) -> Result<Response, ApiError> {
    let session = state.sessions.get(session_id)?;
    Ok(Json(SessionView::new(session, state)).into_response())
}

async fn submit_query(
    state: Arc<AppState>,
    session_id: String,
    query: String,
) -> Result<Response, ApiError> {
    let session = state.sessions.get(&session_id)?;
    session.require_authenticated()?;

    if query.trim().is_empty() {
        return Err(ApiError::BadRequest("Query must not be empty".to_string()));
    }

    tracing::info!(
        session = %session_id,
        backend = state.backend.kind().as_str(),
        "Handling query"
    );
    let answer = state
        .backend
        .answer(&query, session.prompt_template.as_deref())
        .await?;

    Ok(stream_answer(state, session_id, query, answer))
}

#[derive(Serialize)]
struct TokenPayload<'a> {
    token: &'a str,
}

/// Forwards tokens to the client as `token` events. The turn is recorded
/// only once the upstream stream has ended cleanly and every token reached
/// the client; it is then followed by `context` (when passages exist) and
/// `done`. A failure mid-stream ends with a single `error` event.
fn stream_answer(
    state: Arc<AppState>,
    session_id: String,
    query: String,
    answer: QueryAnswer,
) -> Response {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(SSE_BUFFER);
    let QueryAnswer {
        mut tokens,
        passages,
    } = answer;

    tokio::spawn(async move {
        let mut full_answer = String::new();
        while let Some(item) = tokens.recv().await {
            match item {
                Ok(token) => {
                    let event = json_event("token", &TokenPayload { token: &token });
                    full_answer.push_str(&token);
                    if tx.send(Ok(event)).await.is_err() {
                        tracing::warn!(session = %session_id, "Client disconnected mid-answer");
                        return;
                    }
                }
                Err(err) => {
                    tracing::warn!(session = %session_id, "Answer stream failed: {}", err);
                    let _ = tx
                        .send(Ok(json_event("error", &json!({ "error": err.to_string() }))))
                        .await;
                    return;
                }
            }
        }

        let recorded = state.sessions.update(&session_id, |session| {
            session.transcript.record_turn(query, full_answer.clone());
            session.transcript.len()
        });
        match recorded {
            Ok(len) => {
                tracing::debug!(session = %session_id, entries = len, "Recorded turn");
            }
            Err(err) => {
                let _ = tx
                    .send(Ok(json_event("error", &json!({ "error": err.to_string() }))))
                    .await;
                return;
            }
        }

        if !passages.is_empty() {
            let _ = tx
                .send(Ok(json_event("context", &json!({ "passages": passages }))))
                .await;
        }
        let _ = tx
            .send(Ok(json_event("done", &json!({ "answer": full_answer }))))
            .await;
    });

    Sse::new(ReceiverStream::new(rx))
        .keep_alive(KeepAlive::new().interval(SSE_KEEP_ALIVE))
        .into_response()
}

fn json_event<T: Serialize>(name: &str, payload: &T) -> Event {
    let data = serde_json::to_string(payload).unwrap_or_default();
    Event::default().event(name).data(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_are_tagged_by_type() {
        let action: UserAction =
            serde_json::from_str(r#"{"type":"submit_query","query":"Hvad er kvælstof?"}"#)
                .expect("action");
        assert!(matches!(action, UserAction::SubmitQuery { ref query } if query == "Hvad er kvælstof?"));

        let action: UserAction =
            serde_json::from_str(r#"{"type":"reset_transcript"}"#).expect("action");
        assert!(matches!(action, UserAction::ResetTranscript));

        let action: UserAction =
            serde_json::from_str(r#"{"type":"update_prompt"}"#).expect("action");
        assert!(matches!(action, UserAction::UpdatePrompt { template: None }));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let result = serde_json::from_str::<UserAction>(r#"{"type":"delete_everything"}"#);
        assert!(result.is_err());
    }
}
