//! Question generation for the next placeholder.
//!
//! Target selection is deterministic (see [`Session::next_target`]); only the
//! phrasing comes from the language model. The generator keeps its own running
//! context of acknowledgments on the session, separate from anything the
//! extractor or explainer sees.

use std::sync::Arc;

use tracing::warn;

use crate::domain::template::{PlaceholderDefinition, Session};
use crate::ports::{LanguageModelService, ModelPrompt};

/// Fixed sentence returned once nothing is left to ask.
pub const COMPLETION_MESSAGE: &str =
    "All placeholders are filled in. Your document is ready to be generated.";

const QUESTION_SYSTEM_PROMPT: &str = "You help someone fill in the blanks of a document template.\n\
Write exactly one short, friendly question asking for the blank described below.\n\
Use the values already given only to match tone; never reuse them as the answer.\n\
Reply with the question text only.";

/// Deterministic question used when the model cannot phrase one.
pub fn fallback_question(placeholder: &PlaceholderDefinition) -> String {
    match &placeholder.description {
        Some(desc) if !desc.trim().is_empty() => {
            format!("Please provide the {} ({}).", placeholder.label, desc.trim())
        }
        _ => format!("Please provide the {}.", placeholder.label),
    }
}

pub struct QuestionGenerator {
    language_model: Arc<dyn LanguageModelService>,
    context_limit: usize,
}

impl QuestionGenerator {
    pub fn new(language_model: Arc<dyn LanguageModelService>, context_limit: usize) -> Self {
        Self {
            language_model,
            context_limit,
        }
    }

    /// Asks about the next target and records it as the pending question.
    ///
    /// Returns [`COMPLETION_MESSAGE`] without calling the model when every
    /// placeholder is filled.
    pub async fn next_question(&self, session: &mut Session) -> String {
        let Some(target) = session.next_target().cloned() else {
            return COMPLETION_MESSAGE.to_string();
        };

        let prompt = self.build_prompt(session, &target);
        let question = match self.language_model.generate(prompt).await {
            Ok(text) => clean_question(&text).unwrap_or_else(|| fallback_question(&target)),
            Err(e) => {
                warn!(
                    session_id = %session.id(),
                    placeholder = %target.key,
                    error = %e,
                    "question generation failed, using template question"
                );
                fallback_question(&target)
            }
        };

        if let Err(e) = session.ask(&target.key, &question) {
            warn!(session_id = %session.id(), error = %e, "could not record pending question");
        }
        question
    }

    /// Adds an acknowledgment to the generator's running context.
    pub fn acknowledge(&self, session: &mut Session, acknowledgment: &str) {
        session.record_acknowledgment(acknowledgment, self.context_limit);
    }

    fn build_prompt(&self, session: &Session, target: &PlaceholderDefinition) -> ModelPrompt {
        let mut user = format!(
            "Blank: {}\nType: {}\nRequired: {}\n",
            target.label,
            target.placeholder_type,
            if target.required { "yes" } else { "no" }
        );
        if let Some(desc) = &target.description {
            user.push_str(&format!("Description: {}\n", desc));
        }
        if session.skipped().contains(&target.key) {
            user.push_str("The user skipped this blank earlier; invite them back to it gently.\n");
        }

        let filled = session.filled_values();
        if !filled.is_empty() {
            user.push_str("Already given:\n");
            for (p, value) in filled {
                user.push_str(&format!("- {}: {}\n", p.label, value));
            }
        }

        if !session.question_context().is_empty() {
            user.push_str("Recent acknowledgments:\n");
            for ack in session.question_context() {
                user.push_str(&format!("- {}\n", ack));
            }
        }

        ModelPrompt::new(QUESTION_SYSTEM_PROMPT, user)
            .for_session(*session.id())
            .with_temperature(0.4)
            .with_max_tokens(120)
    }
}

fn clean_question(text: &str) -> Option<String> {
    let cleaned = text
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\u{201C}' || c == '\u{201D}')
        .trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}
