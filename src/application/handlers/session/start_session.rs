//! StartSessionHandler - Command handler for opening a fill-in session.
//!
//! Detects the template's placeholders, stores a new session, and asks the
//! first question.

use std::sync::Arc;

use tracing::info;

use crate::domain::dialog::DialogEngine;
use crate::domain::foundation::{DomainError, SessionId};
use crate::domain::template::{PlaceholderDefinition, Session};
use crate::ports::{PlaceholderDetector, SessionStore, SessionStoreError};

/// Command to start a session over a template.
#[derive(Debug, Clone)]
pub struct StartSessionCommand {
    pub template_text: String,
}

/// Result of starting a session.
#[derive(Debug, Clone)]
pub struct StartSessionResult {
    pub session_id: SessionId,
    pub placeholders: Vec<PlaceholderDefinition>,
    /// The opening question.
    pub message: String,
}

/// Error type for starting a session.
#[derive(Debug, Clone)]
pub enum StartSessionError {
    /// The detector found no blanks.
    NoPlaceholders,
    /// Detection or session creation rejected the template.
    Domain(DomainError),
    Storage(String),
}

impl std::fmt::Display for StartSessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartSessionError::NoPlaceholders => write!(f, "Template contains no placeholders"),
            StartSessionError::Domain(err) => write!(f, "{}", err),
            StartSessionError::Storage(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for StartSessionError {}

impl From<DomainError> for StartSessionError {
    fn from(err: DomainError) -> Self {
        StartSessionError::Domain(err)
    }
}

impl From<SessionStoreError> for StartSessionError {
    fn from(err: SessionStoreError) -> Self {
        StartSessionError::Storage(err.to_string())
    }
}

/// Handler for starting sessions.
pub struct StartSessionHandler {
    detector: Arc<dyn PlaceholderDetector>,
    store: Arc<dyn SessionStore>,
    engine: Arc<DialogEngine>,
}

impl StartSessionHandler {
    pub fn new(
        detector: Arc<dyn PlaceholderDetector>,
        store: Arc<dyn SessionStore>,
        engine: Arc<DialogEngine>,
    ) -> Self {
        Self {
            detector,
            store,
            engine,
        }
    }

    pub async fn handle(&self, cmd: StartSessionCommand) -> Result<StartSessionResult, StartSessionError> {
        // 1. Detect blanks
        let placeholders = self.detector.detect(&cmd.template_text).await?;
        if placeholders.is_empty() {
            return Err(StartSessionError::NoPlaceholders);
        }

        // 2. Create and store the session
        let mut session = Session::new(SessionId::new(), cmd.template_text, placeholders)?;
        self.store.save(&session).await?;

        info!(
            session_id = %session.id(),
            placeholders = session.placeholders().len(),
            "session started"
        );

        // 3. Ask the first question
        let opening = self.engine.open(&mut session).await;
        self.store.update(session.id(), &session).await?;

        Ok(StartSessionResult {
            session_id: *session.id(),
            placeholders: session.placeholders().to_vec(),
            message: opening.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockLanguageModel;
    use crate::adapters::{BracketPlaceholderDetector, InMemorySessionStore};
    use crate::domain::dialog::DialogSettings;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::template::PlaceholderType;
    use async_trait::async_trait;

    struct FixedDetector(Vec<PlaceholderDefinition>);

    #[async_trait]
    impl PlaceholderDetector for FixedDetector {
        async fn detect(&self, _template_text: &str) -> Result<Vec<PlaceholderDefinition>, DomainError> {
            Ok(self.0.clone())
        }
    }

    fn handler(
        detector: Arc<dyn PlaceholderDetector>,
        lm: MockLanguageModel,
    ) -> (StartSessionHandler, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        let engine = Arc::new(DialogEngine::new(Arc::new(lm), DialogSettings::default()));
        (StartSessionHandler::new(detector, store.clone(), engine), store)
    }

    #[tokio::test]
    async fn starts_session_and_asks_first_question() {
        let (handler, store) = handler(
            Arc::new(BracketPlaceholderDetector::new()),
            MockLanguageModel::new().with_generation("Who is the landlord?"),
        );

        let result = handler
            .handle(StartSessionCommand {
                template_text: "Lease between [Landlord Name] and [Tenant Name].".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.message, "Who is the landlord?");
        assert_eq!(result.placeholders.len(), 2);

        let stored = store.get(&result.session_id).await.unwrap().unwrap();
        assert_eq!(stored.current_placeholder_key(), Some("landlord_name"));
        assert_eq!(stored.last_question_text(), Some("Who is the landlord?"));
    }

    #[tokio::test]
    async fn template_without_blanks_is_rejected() {
        let (handler, store) = handler(Arc::new(BracketPlaceholderDetector::new()), MockLanguageModel::new());

        let err = handler
            .handle(StartSessionCommand {
                template_text: "Nothing to fill in.".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StartSessionError::NoPlaceholders));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn duplicate_keys_from_detector_are_rejected() {
        let def = PlaceholderDefinition::new("name", "Name", PlaceholderType::Text);
        let (handler, _) = handler(Arc::new(FixedDetector(vec![def.clone(), def])), MockLanguageModel::new());

        let err = handler
            .handle(StartSessionCommand {
                template_text: "[Name] [Name]".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StartSessionError::Domain(ref e) if e.code == ErrorCode::DuplicatePlaceholder));
    }

    #[tokio::test]
    async fn question_failure_still_starts_with_template_question() {
        let (handler, _) = handler(Arc::new(BracketPlaceholderDetector::new()), MockLanguageModel::new());

        let result = handler
            .handle(StartSessionCommand {
                template_text: "Invoice for [Client Name]".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.message, "Please provide the Client Name.");
    }

    #[test]
    fn error_display() {
        assert_eq!(
            StartSessionError::NoPlaceholders.to_string(),
            "Template contains no placeholders"
        );
        assert_eq!(
            StartSessionError::Storage("disk full".to_string()).to_string(),
            "Storage error: disk full"
        );
    }
}
