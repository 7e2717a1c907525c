//! Per-browser-session state: auth flag, chat transcript, prompt override.
//!
//! Each session is an explicit [`SessionContext`] held in a shared
//! [`SessionStore`]; handlers receive a snapshot or mutate it through
//! [`SessionStore::update`]. Nothing is persisted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::core::security::SharedPassword;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Ordered log of user/assistant pairs. Only whole turns are appended.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record_turn(&mut self, query: String, answer: String) {
        let now = Utc::now();
        self.entries.push(TranscriptEntry {
            role: Role::User,
            content: query,
            created_at: now,
        });
        self.entries.push(TranscriptEntry {
            role: Role::Assistant,
            content: answer,
            created_at: now,
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No password submitted yet.
    Pending,
    /// Last submission was wrong; the page shows the error message.
    Rejected,
    Authenticated,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    pub id: String,
    pub auth: AuthState,
    pub transcript: Transcript,
    pub prompt_template: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub last_seen: DateTime<Utc>,
}

impl SessionContext {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            auth: AuthState::Pending,
            transcript: Transcript::default(),
            prompt_template: None,
            created_at: now,
            last_seen: now,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth == AuthState::Authenticated
    }

    /// Checks a submitted password. Already-authenticated sessions pass
    /// without comparing, and a later wrong attempt never revokes access.
    pub fn authenticate(
        &mut self,
        submitted: String,
        expected: &SharedPassword,
    ) -> Result<(), ApiError> {
        if self.is_authenticated() {
            return Ok(());
        }

        if expected.verify(submitted) {
            self.auth = AuthState::Authenticated;
            tracing::info!(session = %self.id, "Session authenticated");
            Ok(())
        } else {
            self.auth = AuthState::Rejected;
            tracing::warn!(session = %self.id, "Rejected password attempt");
            Err(ApiError::WrongPassword)
        }
    }

    pub fn require_authenticated(&self) -> Result<(), ApiError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }

    /// Clears the transcript only; auth state and prompt are untouched.
    pub fn reset_transcript(&mut self) {
        self.transcript.clear();
    }

    /// Blank templates clear the override.
    pub fn set_prompt_template(&mut self, template: Option<String>) {
        self.prompt_template = template.filter(|t| !t.trim().is_empty());
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionContext>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> Result<SessionContext, ApiError> {
        let session = SessionContext::new();
        let mut sessions = self.inner.write().map_err(ApiError::internal)?;
        sessions.insert(session.id.clone(), session.clone());
        tracing::debug!(session = %session.id, "Created session");
        Ok(session)
    }

    /// Snapshot of a session.
    pub fn get(&self, id: &str) -> Result<SessionContext, ApiError> {
        self.update(id, |session| session.clone())
    }

    /// Runs `f` against the live session while holding the write lock.
    pub fn update<F, R>(&self, id: &str, f: F) -> Result<R, ApiError>
    where
        F: FnOnce(&mut SessionContext) -> R,
    {
        let mut sessions = self.inner.write().map_err(ApiError::internal)?;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", id)))?;
        session.last_seen = Utc::now();
        Ok(f(session))
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops sessions idle for longer than `max_idle`; returns how many.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        let cutoff = Utc::now() - max_idle;
        let Ok(mut sessions) = self.inner.write() else {
            return 0;
        };
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen >= cutoff);
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password() -> SharedPassword {
        SharedPassword::new("Hemmelig123")
    }

    #[test]
    fn wrong_password_never_authenticates() {
        let mut session = SessionContext::new();

        let result = session.authenticate("hemmelig123".to_string(), &password());

        assert!(matches!(result, Err(ApiError::WrongPassword)));
        assert_eq!(session.auth, AuthState::Rejected);
        assert!(!session.is_authenticated());
        assert!(session.require_authenticated().is_err());
    }

    #[test]
    fn correct_password_after_rejection_authenticates() {
        let mut session = SessionContext::new();
        let _ = session.authenticate("forkert".to_string(), &password());

        session
            .authenticate("Hemmelig123".to_string(), &password())
            .expect("authenticated");

        assert!(session.is_authenticated());
    }

    #[test]
    fn auth_flag_is_never_reset_once_true() {
        let mut session = SessionContext::new();
        session
            .authenticate("Hemmelig123".to_string(), &password())
            .expect("authenticated");

        let later = session.authenticate("forkert".to_string(), &password());

        assert!(later.is_ok());
        assert!(session.is_authenticated());
    }

    #[test]
    fn record_turn_appends_user_then_assistant() {
        let mut transcript = Transcript::default();

        transcript.record_turn("Spørgsmål".to_string(), "Svar".to_string());

        let roles: Vec<Role> = transcript.entries().iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(transcript.entries()[0].content, "Spørgsmål");
        assert_eq!(transcript.entries()[1].content, "Svar");
    }

    #[test]
    fn reset_clears_transcript_and_keeps_auth_and_prompt() {
        let mut session = SessionContext::new();
        session
            .authenticate("Hemmelig123".to_string(), &password())
            .expect("authenticated");
        session.set_prompt_template(Some("Svar kort.".to_string()));
        session.transcript.record_turn("a".to_string(), "b".to_string());
        session.transcript.record_turn("c".to_string(), "d".to_string());

        session.reset_transcript();

        assert!(session.transcript.is_empty());
        assert!(session.is_authenticated());
        assert_eq!(session.prompt_template.as_deref(), Some("Svar kort."));
    }

    #[test]
    fn blank_prompt_template_clears_override() {
        let mut session = SessionContext::new();
        session.set_prompt_template(Some("Svar kort.".to_string()));

        session.set_prompt_template(Some("  \n".to_string()));

        assert_eq!(session.prompt_template, None);
    }

    #[test]
    fn store_keeps_sessions_independent() {
        let store = SessionStore::new();
        let first = store.create().expect("first");
        let second = store.create().expect("second");

        store
            .update(&first.id, |s| s.authenticate("Hemmelig123".to_string(), &password()))
            .expect("session")
            .expect("authenticated");

        assert!(store.get(&first.id).expect("first").is_authenticated());
        assert!(!store.get(&second.id).expect("second").is_authenticated());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn store_reports_unknown_session() {
        let store = SessionStore::new();

        assert!(matches!(store.get("nope"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn prune_idle_drops_stale_sessions_only() {
        let store = SessionStore::new();
        let stale = store.create().expect("stale");
        let fresh = store.create().expect("fresh");
        {
            let mut sessions = store.inner.write().expect("lock");
            let session = sessions.get_mut(&stale.id).expect("stale session");
            session.last_seen = Utc::now() - chrono::Duration::hours(2);
        }

        let removed = store.prune_idle(Duration::from_secs(60 * 60));

        assert_eq!(removed, 1);
        assert!(store.get(&stale.id).is_err());
        assert!(store.get(&fresh.id).is_ok());
    }
}
