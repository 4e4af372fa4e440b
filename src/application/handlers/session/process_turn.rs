//! ProcessTurnHandler - Command handler for one user turn.
//!
//! Holds the session's lock across load → engine → save so turns on the same
//! session never interleave.

use std::sync::Arc;

use tracing::debug;

use crate::application::SessionLocks;
use crate::domain::dialog::{DialogEngine, TurnResponse};
use crate::domain::foundation::SessionId;
use crate::ports::{SessionStore, SessionStoreError};

/// Command to process a user turn.
#[derive(Debug, Clone)]
pub struct ProcessTurnCommand {
    pub session_id: SessionId,
    pub turn_text: String,
    /// Placeholder the client believes is being answered.
    pub current_placeholder_key: Option<String>,
}

impl ProcessTurnCommand {
    pub fn new(session_id: SessionId, turn_text: impl Into<String>) -> Self {
        Self {
            session_id,
            turn_text: turn_text.into(),
            current_placeholder_key: None,
        }
    }

    pub fn with_current_placeholder(mut self, key: impl Into<String>) -> Self {
        self.current_placeholder_key = Some(key.into());
        self
    }
}

/// Error type for processing turns.
#[derive(Debug, Clone)]
pub enum ProcessTurnError {
    NotFound(SessionId),
    Storage(String),
}

impl std::fmt::Display for ProcessTurnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessTurnError::NotFound(id) => write!(f, "Session not found: {}", id),
            ProcessTurnError::Storage(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for ProcessTurnError {}

impl From<SessionStoreError> for ProcessTurnError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::NotFound(id) => ProcessTurnError::NotFound(id),
            other => ProcessTurnError::Storage(other.to_string()),
        }
    }
}

/// Handler for user turns.
pub struct ProcessTurnHandler {
    store: Arc<dyn SessionStore>,
    engine: Arc<DialogEngine>,
    locks: SessionLocks,
}

impl ProcessTurnHandler {
    pub fn new(store: Arc<dyn SessionStore>, engine: Arc<DialogEngine>, locks: SessionLocks) -> Self {
        Self {
            store,
            engine,
            locks,
        }
    }

    pub async fn handle(&self, cmd: ProcessTurnCommand) -> Result<TurnResponse, ProcessTurnError> {
        let _guard = self.locks.acquire(cmd.session_id).await;

        // 1. Load
        let mut session = self
            .store
            .get(&cmd.session_id)
            .await?
            .ok_or(ProcessTurnError::NotFound(cmd.session_id))?;

        // 2. Honour the client's placeholder hint when it names an open blank
        if let Some(key) = cmd.current_placeholder_key.as_deref() {
            if !session.state().is_complete() && session.placeholder(key).is_some() && !session.is_filled(key) {
                if let Ok(true) = session.focus(key) {
                    debug!(session_id = %cmd.session_id, placeholder = %key, "focused on hinted placeholder");
                }
            } else {
                debug!(session_id = %cmd.session_id, placeholder = %key, "ignoring placeholder hint");
            }
        }

        // 3. Run the turn
        let response = self.engine.handle_turn(&mut session, &cmd.turn_text).await;

        // 4. Persist
        self.store.update(&cmd.session_id, &session).await?;

        Ok(response)
    }
}
