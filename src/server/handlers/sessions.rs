use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::core::config::BackendKind;
use crate::core::errors::ApiError;
use crate::core::security::WRONG_PASSWORD_MESSAGE;
use crate::rag::DEFAULT_PROMPT;
use crate::session::{AuthState, SessionContext, Transcript};
use crate::state::AppState;

/// What the chat page needs to render a session.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: String,
    pub backend: &'static str,
    pub auth: AuthState,
    /// Message shown under the password field while the last attempt was wrong.
    pub auth_error: Option<&'static str>,
    pub transcript: Transcript,
    /// The template queries will use; `None` on the agent backend.
    pub prompt_template: Option<String>,
    pub custom_prompt: bool,
}

impl SessionView {
    pub fn new(session: SessionContext, state: &AppState) -> Self {
        let kind = state.backend.kind();
        let custom_prompt = session.prompt_template.is_some();
        let prompt_template = match kind {
            BackendKind::Rag => Some(
                session
                    .prompt_template
                    .unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            ),
            BackendKind::Agent => None,
        };

        // The transcript stays hidden until the password gate is passed.
        let transcript = if session.auth == AuthState::Authenticated {
            session.transcript
        } else {
            Transcript::default()
        };

        Self {
            id: session.id,
            backend: kind.as_str(),
            auth: session.auth,
            auth_error: (session.auth == AuthState::Rejected).then_some(WRONG_PASSWORD_MESSAGE),
            transcript,
            prompt_template,
            custom_prompt,
        }
    }
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.create()?;
    Ok((StatusCode::CREATED, Json(SessionView::new(session, &state))))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.get(&session_id)?;
    Ok(Json(SessionView::new(session, &state)))
}
