//! GetSessionHandler - Query handler for a session's progress.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::SessionId;
use crate::domain::template::Session;
use crate::ports::{SessionStore, SessionStoreError};

/// Query to get a session by ID.
#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: SessionId,
}

/// Progress snapshot of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub session_id: SessionId,
    /// Placeholders with a non-blank value.
    pub filled: usize,
    pub total: usize,
    pub skipped: Vec<String>,
    pub is_complete: bool,
    /// Placeholder values keyed by placeholder key; orphans excluded.
    pub responses: BTreeMap<String, String>,
    pub current_placeholder_key: Option<String>,
}

impl SessionProgress {
    pub fn from_session(session: &Session) -> Self {
        let responses: BTreeMap<String, String> = session
            .filled_values()
            .into_iter()
            .map(|(p, v)| (p.key.clone(), v.to_string()))
            .collect();

        Self {
            session_id: *session.id(),
            filled: responses.len(),
            total: session.placeholders().len(),
            skipped: session.skipped().iter().cloned().collect(),
            is_complete: session.is_complete(),
            responses,
            current_placeholder_key: session.current_placeholder_key().map(str::to_string),
        }
    }
}

/// Error type for session queries.
#[derive(Debug, Clone)]
pub enum GetSessionError {
    NotFound(SessionId),
    Storage(String),
}

impl std::fmt::Display for GetSessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetSessionError::NotFound(id) => write!(f, "Session not found: {}", id),
            GetSessionError::Storage(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for GetSessionError {}

impl From<SessionStoreError> for GetSessionError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::NotFound(id) => GetSessionError::NotFound(id),
            other => GetSessionError::Storage(other.to_string()),
        }
    }
}

/// Handler for session progress queries.
pub struct GetSessionHandler {
    store: Arc<dyn SessionStore>,
}

impl GetSessionHandler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetSessionQuery) -> Result<SessionProgress, GetSessionError> {
        let session = self
            .store
            .get(&query.session_id)
            .await?
            .ok_or(GetSessionError::NotFound(query.session_id))?;

        Ok(SessionProgress::from_session(&session))
    }
}
