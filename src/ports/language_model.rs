//! Language Model Service port.
//!
//! The four text-understanding capabilities the dialog engine consumes. The
//! engine is agnostic to the model behind them; it only relies on the three
//! structured capabilities returning well-formed values.
//!
//! Every error is a service failure. Each dialog component maps it to its own
//! local default, so implementations must not retry silently on behalf of the
//! engine beyond what the provider boundary already does.

use async_trait::async_trait;

use super::AIError;
use crate::domain::dialog::{Classification, PlausibilityReport, RawExtraction};
use crate::domain::foundation::SessionId;

/// A structured prompt for one capability call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrompt {
    pub session_id: Option<SessionId>,
    /// Instructions for the model.
    pub system: String,
    /// The material to work on (user turn, placeholder facts, ...).
    pub user: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ModelPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            session_id: None,
            system: system.into(),
            user: user.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn for_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Port for the language model capabilities.
#[async_trait]
pub trait LanguageModelService: Send + Sync {
    /// Label the purpose of a user turn.
    async fn classify(&self, prompt: ModelPrompt) -> Result<Classification, AIError>;

    /// Map a user turn to raw key/value pairs.
    async fn extract(&self, prompt: ModelPrompt) -> Result<RawExtraction, AIError>;

    /// Produce free text (questions, explanations).
    async fn generate(&self, prompt: ModelPrompt) -> Result<String, AIError>;

    /// Judge whether a value is plausible for its placeholder.
    async fn validate(&self, prompt: ModelPrompt) -> Result<PlausibilityReport, AIError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_model_service_is_object_safe() {
        fn _accepts_dyn(_lm: &dyn LanguageModelService) {}
    }

    #[test]
    fn prompt_builder_sets_fields() {
        let id = SessionId::new();
        let prompt = ModelPrompt::new("system", "user")
            .for_session(id)
            .with_temperature(0.2)
            .with_max_tokens(64);

        assert_eq!(prompt.session_id, Some(id));
        assert_eq!(prompt.temperature, Some(0.2));
        assert_eq!(prompt.max_tokens, Some(64));
    }
}
