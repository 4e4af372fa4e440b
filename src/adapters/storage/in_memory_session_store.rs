//! In-Memory Session Store Adapter
//!
//! Keeps sessions in a process-local map. Used by the binary and in tests;
//! nothing is evicted.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::template::Session;
use crate::ports::{SessionStore, SessionStoreError};

/// In-memory storage for sessions
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Clear all stored sessions (useful for tests)
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.id()) {
            return Err(SessionStoreError::AlreadyExists(*session.id()));
        }
        sessions.insert(*session.id(), session.clone());
        Ok(())
    }

    async fn update(&self, id: &SessionId, session: &Session) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(SessionStoreError::NotFound(*id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::template::{PlaceholderDefinition, PlaceholderType};

    fn session() -> Session {
        Session::new(
            SessionId::new(),
            "[Company Name]",
            vec![PlaceholderDefinition::new("company_name", "Company Name", PlaceholderType::Text)],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_then_get_returns_copy() {
        let store = InMemorySessionStore::new();
        let s = session();

        store.save(&s).await.unwrap();
        let loaded = store.get(s.id()).await.unwrap().unwrap();

        assert_eq!(loaded.id(), s.id());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = InMemorySessionStore::new();
        assert!(store.get(&SessionId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_twice_is_rejected() {
        let store = InMemorySessionStore::new();
        let s = session();
        store.save(&s).await.unwrap();

        let err = store.save(&s).await.unwrap_err();

        assert!(matches!(err, SessionStoreError::AlreadyExists(id) if id == *s.id()));
    }

    #[tokio::test]
    async fn update_replaces_stored_session() {
        let store = InMemorySessionStore::new();
        let mut s = session();
        store.save(&s).await.unwrap();

        s.fill("company_name", "Acme").unwrap();
        store.update(s.id(), &s).await.unwrap();

        let loaded = store.get(s.id()).await.unwrap().unwrap();
        assert_eq!(loaded.responses()["company_name"], "Acme");
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = InMemorySessionStore::new();
        let s = session();

        let err = store.update(s.id(), &s).await.unwrap_err();

        assert!(matches!(err, SessionStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn clear_empties_store() {
        let store = InMemorySessionStore::new();
        store.save(&session()).await.unwrap();

        store.clear().await;

        assert!(store.is_empty().await);
    }
}
