//! Dialog engine - the turn-dispatching state machine.
//!
//! Each turn is classified, routed to exactly one handler, and answered with
//! a [`TurnResponse`]. Handlers are the only code that mutates a session
//! during the conversation. External calls run one after another
//! (classify, extract, validate per value, phrase the next question); a
//! failing call degrades to its component's local default and never aborts
//! the turn.
//!
//! Values are committed by extraction before they are validated. What happens
//! to a committed value that fails validation is decided by
//! [`InvalidValuePolicy`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::classifier::IntentClassifier;
use super::context::TurnContext;
use super::explanation::ExplanationGenerator;
use super::extractor::{ExtractionMode, ValueExtractor};
use super::question::{QuestionGenerator, COMPLETION_MESSAGE};
use super::settings::{DialogSettings, InvalidValuePolicy};
use super::validator::Validator;
use super::values::{Classification, ExtractionResult, QueryType, TurnResponse, ValidationResult};
use crate::domain::template::Session;
use crate::ports::LanguageModelService;

/// Words that tie a question to the question just asked.
pub const LAST_QUESTION_CUES: &[&str] = &["what", "that", "this"];

/// Whole-turn phrases that mean "carry on".
pub const AFFIRMATIVE_PHRASES: &[&str] = &[
    "yes",
    "yep",
    "yeah",
    "y",
    "ok",
    "okay",
    "sure",
    "continue",
    "let's continue",
    "lets continue",
    "go on",
    "go ahead",
    "proceed",
    "keep going",
    "next question",
    "sounds good",
    "ready",
    "i'm ready",
    "keep it",
    "yes keep it",
    "yes, keep it",
    "that's fine",
    "that's correct",
    "correct",
];

const NOT_UNDERSTOOD: &str = "I couldn't find a value in that.";
const CONTINUE_OFFER: &str = "Say \"continue\" whenever you want to pick up with the next item.";

/// True if the turn asks about the question that was just asked.
pub fn refers_to_last_question(turn_text: &str) -> bool {
    turn_text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| LAST_QUESTION_CUES.contains(&word) || word.starts_with("mean"))
}

/// True if the whole turn is an affirmative continuation.
pub fn is_affirmative(turn_text: &str) -> bool {
    let normalized = turn_text
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | '!'))
        .trim()
        .to_lowercase()
        .replace('\u{2019}', "'");
    AFFIRMATIVE_PHRASES.contains(&normalized.as_str())
}

fn join_parts<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .filter(|p| !p.as_ref().trim().is_empty())
        .map(|p| p.as_ref().trim().to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn list_sentence(items: &[String]) -> String {
    items
        .iter()
        .map(|i| i.trim().trim_end_matches('.').to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The dialog engine.
pub struct DialogEngine {
    classifier: IntentClassifier,
    extractor: ValueExtractor,
    validator: Validator,
    questions: QuestionGenerator,
    explanations: ExplanationGenerator,
    settings: DialogSettings,
}

impl DialogEngine {
    pub fn new(language_model: Arc<dyn LanguageModelService>, settings: DialogSettings) -> Self {
        Self {
            classifier: IntentClassifier::new(language_model.clone(), settings.min_confidence),
            extractor: ValueExtractor::new(language_model.clone()),
            validator: Validator::new(language_model.clone(), settings.plausibility_check),
            questions: QuestionGenerator::new(language_model.clone(), settings.question_context_limit),
            explanations: ExplanationGenerator::new(language_model),
            settings,
        }
    }

    pub fn settings(&self) -> &DialogSettings {
        &self.settings
    }

    /// Produces the opening question for a new session.
    pub async fn open(&self, session: &mut Session) -> TurnResponse {
        if session.refresh_completion() {
            return TurnResponse::new(COMPLETION_MESSAGE, true);
        }
        let question = self.questions.next_question(session).await;
        TurnResponse::new(question, false)
    }

    /// Handles one user turn.
    ///
    /// A complete session is terminal: the completion message is returned
    /// and nothing is called or changed.
    pub async fn handle_turn(&self, session: &mut Session, turn_text: &str) -> TurnResponse {
        if session.state().is_complete() || session.refresh_completion() {
            return TurnResponse::new(COMPLETION_MESSAGE, true);
        }

        let classification = if !session.held().is_empty() && is_affirmative(turn_text) {
            Classification::new(QueryType::General, 1.0).with_reasoning("confirms held values")
        } else {
            self.classifier
                .classify(turn_text, &TurnContext::from_session(session))
                .await
        };

        info!(
            session_id = %session.id(),
            query_type = %classification.query_type,
            confidence = classification.confidence,
            "handling turn"
        );

        let response = match classification.query_type {
            QueryType::Answer => self.handle_answer(session, turn_text).await,
            QueryType::Question => self.handle_question(session, turn_text).await,
            QueryType::Clarification => self.handle_clarification(session, turn_text).await,
            QueryType::Correction => self.handle_correction(session, turn_text).await,
            QueryType::Skip => self.handle_skip(session).await,
            QueryType::General => self.handle_general(session, turn_text).await,
        };

        if response.query_type.is_some() {
            response
        } else {
            response.with_query_type(classification.query_type)
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Handlers
    // ───────────────────────────────────────────────────────────────

    async fn handle_answer(&self, session: &mut Session, turn_text: &str) -> TurnResponse {
        let extraction = self
            .extractor
            .extract(session, turn_text, ExtractionMode::FillOnly)
            .await;
        self.after_extraction(session, extraction).await
    }

    async fn handle_correction(&self, session: &mut Session, turn_text: &str) -> TurnResponse {
        let extraction = self
            .extractor
            .extract(session, turn_text, ExtractionMode::Overwrite)
            .await;
        self.after_extraction(session, extraction).await
    }

    async fn handle_question(&self, session: &mut Session, turn_text: &str) -> TurnResponse {
        let explanation = self.explanations.explain(session, turn_text).await;

        let follow_up = match pending_question(session) {
            Some(question) if refers_to_last_question(turn_text) => question,
            _ => self.questions.next_question(session).await,
        };

        TurnResponse::new(join_parts([explanation, follow_up]), false)
    }

    async fn handle_clarification(&self, session: &mut Session, turn_text: &str) -> TurnResponse {
        let extraction = self
            .extractor
            .extract(session, turn_text, ExtractionMode::FillOnly)
            .await;

        if extraction.is_confident() {
            debug!(session_id = %session.id(), "clarification carried a value, handling as answer");
            return self
                .after_extraction(session, extraction)
                .await
                .with_query_type(QueryType::Answer);
        }

        let explanation = self.explanations.explain(session, turn_text).await;

        // Values written by a hesitant extraction still go through validation
        // and the completion check.
        if !extraction.filled_keys.is_empty() {
            debug!(
                session_id = %session.id(),
                filled = extraction.filled_keys.len(),
                "clarification stored values without confidence"
            );
            let response = self.after_extraction(session, extraction).await;
            return TurnResponse {
                message: join_parts([explanation, response.message]),
                ..response
            };
        }

        let follow_up = match pending_question(session) {
            Some(question) => {
                session.await_clarification();
                question
            }
            None => self.questions.next_question(session).await,
        };

        TurnResponse::new(join_parts([explanation, follow_up]), false)
            .with_extracted_values(extraction.extracted_values)
    }

    async fn handle_skip(&self, session: &mut Session) -> TurnResponse {
        let target = session
            .current_placeholder_key()
            .filter(|k| !session.is_filled(k))
            .map(str::to_string)
            .or_else(|| session.unfilled().first().map(|p| p.key.clone()));

        let Some(key) = target else {
            return TurnResponse::new(COMPLETION_MESSAGE, session.refresh_completion());
        };

        if let Err(e) = session.skip(&key) {
            warn!(session_id = %session.id(), placeholder = %key, error = %e, "could not skip placeholder");
        }
        let skipped_label = session
            .placeholder(&key)
            .map(|p| p.label.clone())
            .unwrap_or_else(|| key.clone());

        let resuming = session
            .next_target()
            .filter(|next| session.skipped().contains(&next.key))
            .map(|next| next.label.clone());

        let lead = match resuming {
            Some(label) if label == skipped_label => format!(
                "The {} is the only thing left, so let's try it once more.",
                label
            ),
            Some(label) => format!(
                "Everything else is done, so let's come back to the {}.",
                label
            ),
            None => format!("No problem, we'll come back to the {} later.", skipped_label),
        };

        let question = self.questions.next_question(session).await;
        TurnResponse::new(join_parts([lead, question]), false)
    }

    async fn handle_general(&self, session: &mut Session, turn_text: &str) -> TurnResponse {
        if is_affirmative(turn_text) {
            let committed = if session.held().is_empty() {
                Vec::new()
            } else {
                match session.commit_held() {
                    Ok(keys) => keys,
                    Err(e) => {
                        warn!(session_id = %session.id(), error = %e, "could not commit held values");
                        Vec::new()
                    }
                }
            };

            let note = if committed.is_empty() {
                String::new()
            } else {
                let labels: Vec<String> = committed
                    .iter()
                    .filter_map(|k| session.placeholder(k).map(|p| p.label.clone()))
                    .collect();
                format!("Okay, I've kept the {} as you gave it.", labels.join(", "))
            };

            if session.refresh_completion() {
                return TurnResponse::new(join_parts([note.as_str(), COMPLETION_MESSAGE]), true);
            }

            let question = self.questions.next_question(session).await;
            return TurnResponse::new(join_parts([note, question]), false);
        }

        let explanation = self.explanations.explain(session, turn_text).await;
        TurnResponse::new(join_parts([explanation.as_str(), CONTINUE_OFFER]), false)
    }

    // ───────────────────────────────────────────────────────────────
    // Shared post-extraction logic
    // ───────────────────────────────────────────────────────────────

    async fn after_extraction(&self, session: &mut Session, extraction: ExtractionResult) -> TurnResponse {
        if extraction.filled_keys.is_empty() {
            return self.reask(session, extraction).await;
        }

        let (validation, notes) = self.validate_filled(session, &extraction.filled_keys).await;
        let acknowledgment = extraction.acknowledgment.clone().unwrap_or_default();

        if session.refresh_completion() {
            info!(session_id = %session.id(), "session complete");
            let mut parts = vec![acknowledgment];
            parts.extend(notes);
            parts.push(COMPLETION_MESSAGE.to_string());
            return TurnResponse::new(join_parts(parts), true)
                .with_extracted_values(extraction.extracted_values)
                .with_needs_clarification(false)
                .with_validation(validation);
        }

        if !acknowledgment.is_empty() {
            self.questions.acknowledge(session, &acknowledgment);
        }
        let question = self.questions.next_question(session).await;

        let mut parts = vec![acknowledgment];
        parts.extend(notes);
        parts.push(question);
        TurnResponse::new(join_parts(parts), false)
            .with_extracted_values(extraction.extracted_values)
            .with_needs_clarification(false)
            .with_validation(validation)
    }

    /// Nothing was filled: repeat the pending question word for word.
    async fn reask(&self, session: &mut Session, extraction: ExtractionResult) -> TurnResponse {
        let lead = extraction
            .acknowledgment
            .clone()
            .unwrap_or_else(|| NOT_UNDERSTOOD.to_string());

        let question = match pending_question(session) {
            Some(question) => {
                session.await_clarification();
                question
            }
            None => self.questions.next_question(session).await,
        };

        TurnResponse::new(join_parts([lead, question]), false)
            .with_extracted_values(extraction.extracted_values)
            .with_needs_clarification(true)
    }

    /// Validates every value written this turn and applies the invalid value policy.
    async fn validate_filled(
        &self,
        session: &mut Session,
        keys: &[String],
    ) -> (BTreeMap<String, ValidationResult>, Vec<String>) {
        let mut results = BTreeMap::new();
        let mut notes = Vec::new();

        for key in keys {
            let Some(placeholder) = session.placeholder(key).cloned() else {
                continue;
            };
            let Some(value) = session.responses().get(key).cloned() else {
                continue;
            };

            let result = self.validator.validate(*session.id(), &placeholder, &value).await;

            if !result.is_valid {
                match self.settings.invalid_value_policy {
                    InvalidValuePolicy::Keep => notes.push(format!(
                        "There may be a problem with the {}: {}.",
                        placeholder.label,
                        list_sentence(&result.errors)
                    )),
                    InvalidValuePolicy::Hold => {
                        if let Err(e) = session.hold(key) {
                            warn!(session_id = %session.id(), placeholder = %key, error = %e, "could not hold value");
                        }
                        notes.push(format!(
                            "I haven't saved \"{}\" as the {} yet: {}. Reply \"yes\" to keep it anyway, or give a corrected value.",
                            value,
                            placeholder.label,
                            list_sentence(&result.errors)
                        ));
                    }
                }
            }
            if !result.warnings.is_empty() {
                notes.push(format!(
                    "Heads up on the {}: {}.",
                    placeholder.label,
                    list_sentence(&result.warnings)
                ));
            }

            debug!(
                session_id = %session.id(),
                placeholder = %key,
                is_valid = result.is_valid,
                "value validated"
            );
            results.insert(key.clone(), result);
        }

        (results, notes)
    }
}

/// The pending question text, if it is still about an unfilled placeholder.
fn pending_question(session: &Session) -> Option<String> {
    let key = session.current_placeholder_key()?;
    if session.is_filled(key) {
        return None;
    }
    session.last_question_text().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockError, MockLanguageModel};
    use crate::domain::dialog::{ExtractedPair, RawExtraction};
    use crate::domain::foundation::SessionId;
    use crate::domain::template::{DialogState, PlaceholderDefinition, PlaceholderType};

    const COMPANY_Q: &str = "What is the company's name?";
    const DATE_Q: &str = "When will the agreement be signed?";

    fn session() -> Session {
        Session::new(
            SessionId::new(),
            "This agreement is made by [Company Name] on [Signing Date].",
            vec![
                PlaceholderDefinition::new("company_name", "Company Name", PlaceholderType::Text),
                PlaceholderDefinition::new("signing_date", "Signing Date", PlaceholderType::Date),
            ],
        )
        .unwrap()
    }

    fn engine(lm: &Arc<MockLanguageModel>) -> DialogEngine {
        DialogEngine::new(lm.clone(), DialogSettings::default().without_plausibility_check())
    }

    fn classified(query_type: QueryType) -> Classification {
        Classification::new(query_type, 0.95)
    }

    fn extraction(pairs: &[(&str, &str)]) -> RawExtraction {
        RawExtraction {
            understood: !pairs.is_empty(),
            values: pairs.iter().map(|(k, v)| ExtractedPair::new(*k, *v)).collect(),
            acknowledgment: None,
            needs_clarification: pairs.is_empty(),
        }
    }

    #[test]
    fn last_question_cues_match_words() {
        assert!(refers_to_last_question("What do you mean?"));
        assert!(refers_to_last_question("meaning?"));
        assert!(refers_to_last_question("Is that the legal name"));
        assert!(!refers_to_last_question("How long is the lease"));
    }

    #[test]
    fn affirmatives_are_whole_turn_matches() {
        assert!(is_affirmative("Yes!"));
        assert!(is_affirmative("  let\u{2019}s continue. "));
        assert!(!is_affirmative("yes it is Acme"));
    }

    #[tokio::test]
    async fn open_asks_first_placeholder() {
        let lm = Arc::new(MockLanguageModel::new().with_generation(COMPANY_Q));
        let engine = engine(&lm);
        let mut s = session();

        let response = engine.open(&mut s).await;

        assert_eq!(response.message, COMPANY_Q);
        assert!(!response.is_complete);
        assert_eq!(s.current_placeholder_key(), Some("company_name"));
    }

    #[tokio::test]
    async fn answer_fills_current_placeholder_and_asks_next() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_generation(COMPANY_Q)
                .with_classification(classified(QueryType::Answer))
                .with_extraction(RawExtraction {
                    acknowledgment: Some("Thanks, Acme Corp it is.".to_string()),
                    ..extraction(&[("company_name", "Acme Corp")])
                })
                .with_generation(DATE_Q),
        );
        let engine = engine(&lm);
        let mut s = session();
        engine.open(&mut s).await;

        let response = engine.handle_turn(&mut s, "Acme Corp").await;

        assert_eq!(s.responses()["company_name"], "Acme Corp");
        assert!(!response.is_complete);
        assert_eq!(response.query_type, Some(QueryType::Answer));
        assert_eq!(response.needs_clarification, Some(false));
        assert_eq!(response.message, format!("Thanks, Acme Corp it is.\n\n{}", DATE_Q));
        assert_eq!(s.current_placeholder_key(), Some("signing_date"));
        assert_eq!(s.question_context(), &["Thanks, Acme Corp it is."]);
    }

    #[tokio::test]
    async fn unparseable_answer_reasks_same_question() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_generation(COMPANY_Q)
                .with_classification(classified(QueryType::Answer))
                .with_extraction_error(MockError::Unavailable {
                    message: "down".to_string(),
                }),
        );
        let engine = engine(&lm);
        let mut s = session();
        engine.open(&mut s).await;

        let response = engine.handle_turn(&mut s, "blorp").await;

        assert_eq!(response.needs_clarification, Some(true));
        assert!(response.message.ends_with(COMPANY_Q));
        assert!(matches!(s.state(), DialogState::AwaitingClarification { .. }));
        assert!(s.responses().is_empty());
    }

    #[tokio::test]
    async fn skip_defers_current_and_moves_on() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_generation(COMPANY_Q)
                .with_generation(DATE_Q),
        );
        let engine = engine(&lm);
        let mut s = session();
        engine.open(&mut s).await;

        let response = engine.handle_turn(&mut s, "skip").await;

        assert_eq!(response.query_type, Some(QueryType::Skip));
        assert!(s.skipped().contains("company_name"));
        assert_eq!(s.current_placeholder_key(), Some("signing_date"));
        assert!(response.message.contains("come back to the Company Name later"));
    }

    #[tokio::test]
    async fn skipping_the_last_open_item_resumes_it() {
        let lm = Arc::new(MockLanguageModel::new());
        let engine = engine(&lm);
        let mut s = session();
        s.fill("company_name", "Acme").unwrap();
        s.ask("signing_date", DATE_Q).unwrap();

        let response = engine.handle_turn(&mut s, "skip").await;

        assert!(!response.is_complete);
        assert!(response.message.contains("only thing left"));
        assert_eq!(s.current_placeholder_key(), Some("signing_date"));
    }

    #[tokio::test]
    async fn filling_last_placeholder_completes() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_classification(classified(QueryType::Answer))
                .with_extraction(extraction(&[("signing_date", "2024-03-01")])),
        );
        let engine = engine(&lm);
        let mut s = session();
        s.fill("company_name", "Acme").unwrap();
        s.skip("signing_date").unwrap();
        s.ask("signing_date", DATE_Q).unwrap();

        let response = engine.handle_turn(&mut s, "March 1st 2024").await;

        assert!(response.is_complete);
        assert!(response.message.ends_with(COMPLETION_MESSAGE));
        assert!(s.state().is_complete());
        assert!(s.skipped().is_empty());
    }

    #[tokio::test]
    async fn complete_session_is_terminal() {
        let lm = Arc::new(MockLanguageModel::new());
        let engine = engine(&lm);
        let mut s = session();
        s.fill("company_name", "Acme").unwrap();
        s.fill("signing_date", "2024-03-01").unwrap();
        s.refresh_completion();

        let response = engine.handle_turn(&mut s, "skip").await;

        assert!(response.is_complete);
        assert_eq!(response.message, COMPLETION_MESSAGE);
        assert_eq!(lm.call_count(), 0);
    }

    #[tokio::test]
    async fn question_about_last_question_reasks_it_verbatim() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_generation(COMPANY_Q)
                .with_classification(classified(QueryType::Question))
                .with_generation("It is the legal name of the business signing the agreement."),
        );
        let engine = engine(&lm);
        let mut s = session();
        engine.open(&mut s).await;

        let response = engine.handle_turn(&mut s, "What do you mean by that?").await;

        assert_eq!(
            response.message,
            format!("It is the legal name of the business signing the agreement.\n\n{}", COMPANY_Q)
        );
        assert_eq!(s.last_question_text(), Some(COMPANY_Q));
    }

    #[tokio::test]
    async fn unrelated_question_explains_and_asks_next() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_generation(COMPANY_Q)
                .with_classification(classified(QueryType::Question))
                .with_generation("The agreement runs for one year.")
                .with_generation("Which company is signing?"),
        );
        let engine = engine(&lm);
        let mut s = session();
        engine.open(&mut s).await;

        let response = engine.handle_turn(&mut s, "How long does it last?").await;

        assert_eq!(
            response.message,
            "The agreement runs for one year.\n\nWhich company is signing?"
        );
        assert_eq!(s.current_placeholder_key(), Some("company_name"));
    }

    #[tokio::test]
    async fn clarification_with_value_is_handled_as_answer() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_generation(COMPANY_Q)
                .with_classification(classified(QueryType::Clarification))
                .with_extraction(extraction(&[("company_name", "Acme Corp")]))
                .with_generation(DATE_Q),
        );
        let engine = engine(&lm);
        let mut s = session();
        engine.open(&mut s).await;

        let response = engine.handle_turn(&mut s, "Oh, the name? It's Acme Corp").await;

        assert_eq!(response.query_type, Some(QueryType::Answer));
        assert_eq!(s.responses()["company_name"], "Acme Corp");
    }

    #[tokio::test]
    async fn clarification_without_value_explains_and_reasks() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_generation(COMPANY_Q)
                .with_classification(classified(QueryType::Clarification))
                .with_extraction(extraction(&[]))
                .with_generation("I need the registered name of the company."),
        );
        let engine = engine(&lm);
        let mut s = session();
        engine.open(&mut s).await;

        let response = engine.handle_turn(&mut s, "I don't follow").await;

        assert_eq!(response.query_type, Some(QueryType::Clarification));
        assert!(response.message.ends_with(COMPANY_Q));
        assert!(matches!(s.state(), DialogState::AwaitingClarification { .. }));
    }

    fn hesitant(pairs: &[(&str, &str)]) -> RawExtraction {
        RawExtraction {
            needs_clarification: true,
            ..extraction(pairs)
        }
    }

    const DATE_EXPLAINED: &str = "It is the day both parties sign.";

    #[tokio::test]
    async fn hesitant_clarification_that_fills_last_blank_completes() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_classification(classified(QueryType::Clarification))
                .with_extraction(hesitant(&[("signing_date", "2024-03-15")]))
                .with_generation(DATE_EXPLAINED),
        );
        let engine = engine(&lm);
        let mut s = session();
        s.fill("company_name", "Acme").unwrap();
        s.ask("signing_date", DATE_Q).unwrap();

        let response = engine.handle_turn(&mut s, "The signing date? Maybe 2024-03-15").await;

        assert!(response.is_complete);
        assert!(s.state().is_complete());
        assert!(response.message.starts_with(DATE_EXPLAINED));
        assert!(response.message.ends_with(COMPLETION_MESSAGE));
        assert_eq!(response.query_type, Some(QueryType::Clarification));
        assert!(response.validation["signing_date"].is_valid);
    }

    #[tokio::test]
    async fn hesitant_clarification_reports_invalid_value_under_keep_policy() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_classification(classified(QueryType::Clarification))
                .with_extraction(hesitant(&[("signing_date", "someday")]))
                .with_generation(DATE_EXPLAINED),
        );
        let engine = engine(&lm);
        let mut s = session();
        s.ask("signing_date", DATE_Q).unwrap();

        let response = engine.handle_turn(&mut s, "Is it someday?").await;

        assert!(!response.is_complete);
        assert_eq!(s.responses()["signing_date"], "someday");
        assert!(!response.validation["signing_date"].is_valid);
        assert!(response.message.contains("There may be a problem with the Signing Date"));
        assert!(response.message.ends_with("Please provide the Company Name."));
    }

    #[tokio::test]
    async fn hesitant_clarification_holds_invalid_value_under_hold_policy() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_classification(classified(QueryType::Clarification))
                .with_extraction(hesitant(&[("signing_date", "someday")]))
                .with_generation(DATE_EXPLAINED),
        );
        let engine = DialogEngine::new(
            lm.clone(),
            DialogSettings::default()
                .without_plausibility_check()
                .with_policy(InvalidValuePolicy::Hold),
        );
        let mut s = session();
        s.ask("signing_date", DATE_Q).unwrap();

        let response = engine.handle_turn(&mut s, "Is it someday?").await;

        assert!(!s.is_filled("signing_date"));
        assert_eq!(s.held()["signing_date"], "someday");
        assert!(response
            .message
            .contains("I haven't saved \"someday\" as the Signing Date yet"));
    }

    #[tokio::test]
    async fn correction_overwrites_existing_value() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_classification(classified(QueryType::Correction))
                .with_extraction(extraction(&[("company_name", "Globex")]))
                .with_generation(DATE_Q),
        );
        let engine = engine(&lm);
        let mut s = session();
        s.fill("company_name", "Acme").unwrap();
        s.ask("signing_date", DATE_Q).unwrap();

        let response = engine.handle_turn(&mut s, "Sorry, the company is Globex").await;

        assert_eq!(s.responses()["company_name"], "Globex");
        assert_eq!(response.extracted_values.unwrap()["company_name"], "Globex");
    }

    #[tokio::test]
    async fn repeated_answer_does_not_overwrite() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_classification(classified(QueryType::Answer))
                .with_extraction(extraction(&[("company_name", "Globex")])),
        );
        let engine = engine(&lm);
        let mut s = session();
        s.fill("company_name", "Acme").unwrap();

        let response = engine.handle_turn(&mut s, "Globex").await;

        assert_eq!(s.responses()["company_name"], "Acme");
        assert_eq!(response.needs_clarification, Some(true));
    }

    #[tokio::test]
    async fn keep_policy_reports_invalid_value_but_stores_it() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_classification(classified(QueryType::Answer))
                .with_extraction(extraction(&[("signing_date", "someday")]))
                .with_generation(COMPANY_Q),
        );
        let engine = engine(&lm);
        let mut s = session();
        s.ask("signing_date", DATE_Q).unwrap();

        let response = engine.handle_turn(&mut s, "someday").await;

        assert_eq!(s.responses()["signing_date"], "someday");
        assert!(response.message.contains("Invalid date format"));
        assert!(!response.validation["signing_date"].is_valid);
    }

    #[tokio::test]
    async fn hold_policy_holds_invalid_value_until_confirmed() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_classification(classified(QueryType::Answer))
                .with_extraction(extraction(&[("signing_date", "someday")]))
                .with_generation(DATE_Q)
                .with_generation(COMPANY_Q),
        );
        let engine = DialogEngine::new(
            lm.clone(),
            DialogSettings::default()
                .without_plausibility_check()
                .with_policy(InvalidValuePolicy::Hold),
        );
        let mut s = session();
        s.skip("company_name").unwrap();
        s.ask("signing_date", DATE_Q).unwrap();

        let response = engine.handle_turn(&mut s, "someday").await;
        assert!(!s.is_filled("signing_date"));
        assert_eq!(s.held()["signing_date"], "someday");
        assert!(response.message.contains("Reply \"yes\" to keep it anyway"));

        let response = engine.handle_turn(&mut s, "yes").await;
        assert_eq!(response.query_type, Some(QueryType::General));
        assert_eq!(s.responses()["signing_date"], "someday");
        assert!(s.held().is_empty());
        assert!(response.message.contains("kept the Signing Date"));
    }

    #[tokio::test]
    async fn general_affirmative_moves_to_next_question() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_classification(classified(QueryType::General))
                .with_generation(COMPANY_Q),
        );
        let engine = engine(&lm);
        let mut s = session();

        let response = engine.handle_turn(&mut s, "ok").await;

        assert_eq!(response.message, COMPANY_Q);
        assert_eq!(s.current_placeholder_key(), Some("company_name"));
    }

    #[tokio::test]
    async fn general_chatter_explains_and_offers_to_continue() {
        let lm = Arc::new(
            MockLanguageModel::new()
                .with_classification(classified(QueryType::General))
                .with_generation("Happy to help you with this lease."),
        );
        let engine = engine(&lm);
        let mut s = session();

        let response = engine.handle_turn(&mut s, "thanks for the help").await;

        assert_eq!(
            response.message,
            format!("Happy to help you with this lease.\n\n{}", CONTINUE_OFFER)
        );
    }
}
