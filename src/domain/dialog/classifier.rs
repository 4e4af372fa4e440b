//! Intent classification for user turns.
//!
//! Unambiguous skip commands are recognised locally. Everything else is
//! labelled by the language model, and any doubt (failure, low confidence,
//! nonsense confidence) resolves to `answer` so the conversation keeps moving.

use std::sync::Arc;

use tracing::{debug, warn};

use super::context::TurnContext;
use super::values::{Classification, QueryType};
use crate::ports::{LanguageModelService, ModelPrompt};

/// Whole-turn phrases that always mean "skip this placeholder".
pub const SKIP_COMMANDS: &[&str] = &[
    "skip",
    "skip this",
    "skip it",
    "skip that",
    "skip this one",
    "skip for now",
    "pass",
    "next",
    "later",
    "not now",
    "i don't know yet",
    "i dont know yet",
    "come back to this later",
    "come back to it later",
];

const CLASSIFY_SYSTEM_PROMPT: &str = "You label one reply in a conversation that fills in the blanks of a document template.\n\
Labels:\n\
- answer: the user gives one or more values for the blanks\n\
- question: the user asks about the document, a blank, or the process\n\
- clarification: the user does not understand what is being asked\n\
- correction: the user changes a value they gave earlier\n\
- skip: the user wants to leave the current blank for later\n\
- general: anything else (greetings, confirmations, small talk)\n\
Respond with JSON only: {\"queryType\": \"<label>\", \"confidence\": <0.0-1.0>, \"reasoning\": \"<short>\"}";

/// True if the whole turn is a recognised skip command.
pub fn is_skip_command(turn_text: &str) -> bool {
    let normalized = turn_text
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | '!'))
        .trim()
        .to_lowercase()
        .replace('\u{2019}', "'");
    SKIP_COMMANDS.contains(&normalized.as_str())
}

/// Labels the purpose of a user turn.
pub struct IntentClassifier {
    language_model: Arc<dyn LanguageModelService>,
    min_confidence: f32,
}

impl IntentClassifier {
    pub fn new(language_model: Arc<dyn LanguageModelService>, min_confidence: f32) -> Self {
        Self {
            language_model,
            min_confidence,
        }
    }

    /// Always returns a label; never fails.
    pub async fn classify(&self, turn_text: &str, context: &TurnContext<'_>) -> Classification {
        if is_skip_command(turn_text) {
            return Classification::new(QueryType::Skip, 1.0).with_reasoning("skip command");
        }

        let prompt = ModelPrompt::new(
            CLASSIFY_SYSTEM_PROMPT,
            format!("{}User reply: {}", context.describe(), turn_text.trim()),
        )
        .for_session(context.session_id)
        .with_temperature(0.0)
        .with_max_tokens(150);

        let classification = match self.language_model.classify(prompt).await {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    session_id = %context.session_id,
                    error = %e,
                    "intent classification failed, treating turn as an answer"
                );
                return Classification::fallback(format!("classification failed: {}", e));
            }
        };

        if !classification.confidence.is_finite() || classification.confidence < self.min_confidence {
            debug!(
                session_id = %context.session_id,
                query_type = %classification.query_type,
                confidence = classification.confidence,
                "low-confidence classification, treating turn as an answer"
            );
            return Classification::fallback("low confidence");
        }

        debug!(
            session_id = %context.session_id,
            query_type = %classification.query_type,
            confidence = classification.confidence,
            reasoning = ?classification.reasoning,
            "turn classified"
        );

        Classification {
            confidence: classification.confidence.clamp(0.0, 1.0),
            ..classification
        }
    }
}
