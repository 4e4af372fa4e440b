//! Session store port.
//!
//! Keyed storage for Session aggregates. The dialog engine reads and writes
//! sessions through this port but never owns persistence; retention and
//! eviction are the store's own business.

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::template::Session;

/// Errors that can occur during session storage operations
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Session already exists: {0}")]
    AlreadyExists(SessionId),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Port for session persistence.
///
/// Implementations do not serialize access per session; callers that mutate
/// a session must hold its lock (see `SessionLocks`).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session.
    ///
    /// Returns `None` if not found.
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, SessionStoreError>;

    /// Save a new session.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if a session with the same id is stored
    async fn save(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Replace a stored session.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no session is stored under `id`
    async fn update(&self, id: &SessionId, session: &Session) -> Result<(), SessionStoreError>;
}
