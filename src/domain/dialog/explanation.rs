//! Explanations for meta-questions about the document or the process.
//!
//! Explaining never advances the session. Model output always passes through
//! the [`FollowUpFilter`], so an explanation cannot leave a second question
//! open next to the pending one.

use std::sync::Arc;

use tracing::warn;

use super::context::TurnContext;
use super::follow_up::FollowUpFilter;
use crate::domain::template::Session;
use crate::ports::{LanguageModelService, ModelPrompt};

/// Returned when the model cannot produce an explanation.
pub const EXPLANATION_FALLBACK: &str =
    "Sorry, I can't explain that right now. Let's keep going with the document.";

/// Template text beyond this many characters is cut from the prompt.
const TEMPLATE_EXCERPT_CHARS: usize = 2_000;

const EXPLAIN_SYSTEM_PROMPT: &str = "You help someone fill in the blanks of a document template.\n\
Answer their question about the document, a blank, or the process in two or three sentences.\n\
Do not ask the user anything and do not offer further help; another message will follow yours.";

pub struct ExplanationGenerator {
    language_model: Arc<dyn LanguageModelService>,
    filter: FollowUpFilter,
}

impl ExplanationGenerator {
    pub fn new(language_model: Arc<dyn LanguageModelService>) -> Self {
        Self {
            language_model,
            filter: FollowUpFilter::new(),
        }
    }

    pub async fn explain(&self, session: &Session, turn_text: &str) -> String {
        let prompt = self.build_prompt(session, turn_text);
        match self.language_model.generate(prompt).await {
            Ok(text) => self.filter.apply(&text),
            Err(e) => {
                warn!(session_id = %session.id(), error = %e, "explanation failed");
                EXPLANATION_FALLBACK.to_string()
            }
        }
    }

    fn build_prompt(&self, session: &Session, turn_text: &str) -> ModelPrompt {
        let context = TurnContext::from_session(session);

        let mut user = String::from("Template:\n");
        user.push_str(&excerpt(session.template_text(), TEMPLATE_EXCERPT_CHARS));
        user.push_str("\n\nBlanks:\n");
        for p in session.placeholders() {
            user.push_str(&format!("- {} ({})", p.label, p.placeholder_type));
            if let Some(desc) = &p.description {
                user.push_str(&format!(": {}", desc));
            }
            user.push('\n');
        }
        user.push_str(&context.describe());
        user.push_str(&format!("User says: {}", turn_text.trim()));

        ModelPrompt::new(EXPLAIN_SYSTEM_PROMPT, user)
            .for_session(context.session_id)
            .with_temperature(0.3)
            .with_max_tokens(250)
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
