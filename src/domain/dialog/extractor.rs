//! Value extraction: turning a user turn into placeholder values.
//!
//! The language model proposes raw key/value pairs; key resolution and the
//! write into the session happen here, so the no-overwrite rule holds no
//! matter what the model returns.

use std::sync::Arc;

use tracing::{debug, warn};

use super::context::TurnContext;
use super::values::ExtractionResult;
use crate::domain::template::{key_candidates, normalize_key, PlaceholderDefinition, Session};
use crate::ports::{LanguageModelService, ModelPrompt};

const EXTRACT_SYSTEM_PROMPT: &str = "You extract values for the blanks of a document template from one user reply.\n\
Only use the placeholder keys listed. Preserve the user's literal formatting: keep currency symbols, percent signs and digit grouping exactly as written.\n\
The only changes you may make are: fixing spelling, normalizing whitespace, writing dates as YYYY-MM-DD, and turning number words into digits.\n\
If the reply does not contain a value, return an empty list and set needsClarification.\n\
Respond with JSON only: {\"understood\": true|false, \"values\": [{\"key\": \"<placeholder key>\", \"value\": \"<value>\"}], \"acknowledgment\": \"<one short sentence>\", \"needsClarification\": true|false}";

/// Whether extraction may replace values that are already filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Only unfilled placeholders are written.
    FillOnly,
    /// Filled placeholders may be replaced (corrections).
    Overwrite,
}

/// Where a raw key from the model ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResolution {
    Placeholder(String),
    Orphan(String),
}

/// Resolves a raw model key against the session's placeholders.
///
/// Order: the current placeholder (equal, substring, or superstring of its key
/// or label), then an exact key or label match anywhere, then an orphan under
/// the canonical key. A blank key binds to the current placeholder if any.
pub fn resolve_key(session: &Session, raw_key: &str, current_key: Option<&str>) -> Option<KeyResolution> {
    let candidates: Vec<String> = key_candidates(raw_key)
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect();
    let current = current_key.and_then(|k| session.placeholder(k));

    if candidates.is_empty() {
        return current.map(|p| KeyResolution::Placeholder(p.key.clone()));
    }

    if let Some(current) = current {
        let label = normalize_key(&current.label);
        let overlaps = |a: &str, b: &str| a == b || a.contains(b) || b.contains(a);
        if candidates
            .iter()
            .any(|c| overlaps(c, &current.key) || overlaps(c, &label))
        {
            return Some(KeyResolution::Placeholder(current.key.clone()));
        }
    }

    for candidate in &candidates {
        if let Some(p) = session
            .placeholders()
            .iter()
            .find(|p| p.key == *candidate || normalize_key(&p.label) == *candidate)
        {
            return Some(KeyResolution::Placeholder(p.key.clone()));
        }
    }

    Some(KeyResolution::Orphan(candidates[0].clone()))
}

/// Maps user turns to placeholder values and writes them into the session.
pub struct ValueExtractor {
    language_model: Arc<dyn LanguageModelService>,
}

impl ValueExtractor {
    pub fn new(language_model: Arc<dyn LanguageModelService>) -> Self {
        Self { language_model }
    }

    /// Extracts values from `turn_text` and commits them to `session`.
    ///
    /// A failed model call yields [`ExtractionResult::failed`] and leaves the
    /// session untouched.
    pub async fn extract(
        &self,
        session: &mut Session,
        turn_text: &str,
        mode: ExtractionMode,
    ) -> ExtractionResult {
        let prompt = self.build_prompt(session, turn_text, mode);
        let session_id = *session.id();

        let raw = match self.language_model.extract(prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "value extraction failed");
                return ExtractionResult::failed();
            }
        };

        let current_key = session.current_placeholder_key().map(str::to_string);
        let mut result = ExtractionResult {
            understood: raw.understood,
            acknowledgment: raw
                .acknowledgment
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
            needs_clarification: raw.needs_clarification,
            ..ExtractionResult::default()
        };

        for pair in raw.values {
            let value = pair.value.trim();
            if value.is_empty() {
                continue;
            }

            match resolve_key(session, &pair.key, current_key.as_deref()) {
                Some(KeyResolution::Placeholder(key)) => {
                    let written = match mode {
                        ExtractionMode::FillOnly => session.fill(&key, value),
                        ExtractionMode::Overwrite => session.overwrite(&key, value),
                    };
                    match written {
                        Ok(true) => {
                            debug!(session_id = %session_id, placeholder = %key, "value stored");
                            result.filled_keys.push(key.clone());
                            result.extracted_values.insert(key, value.to_string());
                        }
                        Ok(false) => {
                            debug!(session_id = %session_id, placeholder = %key, "value ignored, placeholder already filled");
                        }
                        Err(e) => {
                            warn!(session_id = %session_id, placeholder = %key, error = %e, "could not store value");
                        }
                    }
                }
                Some(KeyResolution::Orphan(key)) => {
                    debug!(session_id = %session_id, raw_key = %pair.key, key = %key, "extracted key matches no placeholder");
                    if let Ok(true) = session.record_orphan(&key, value) {
                        result.orphan_keys.push(key.clone());
                        result.extracted_values.insert(key, value.to_string());
                    }
                }
                None => {}
            }
        }

        result
    }

    fn build_prompt(&self, session: &Session, turn_text: &str, mode: ExtractionMode) -> ModelPrompt {
        let targets: Vec<&PlaceholderDefinition> = match mode {
            ExtractionMode::FillOnly => session.unfilled(),
            ExtractionMode::Overwrite => session.placeholders().iter().collect(),
        };

        let mut listing = String::from("Placeholders:\n");
        for p in targets {
            listing.push_str(&format!("- {} ({}, {})", p.key, p.label, p.placeholder_type));
            if let Some(desc) = &p.description {
                listing.push_str(&format!(": {}", desc));
            }
            if let Some(current) = session.responses().get(&p.key) {
                listing.push_str(&format!(" [current value: {}]", current));
            }
            listing.push('\n');
        }

        let context = TurnContext::from_session(session);
        ModelPrompt::new(
            EXTRACT_SYSTEM_PROMPT,
            format!("{}{}User reply: {}", listing, context.describe(), turn_text.trim()),
        )
        .for_session(context.session_id)
        .with_temperature(0.0)
        .with_max_tokens(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockError, MockLanguageModel};
    use crate::domain::dialog::{ExtractedPair, RawExtraction};
    use crate::domain::foundation::SessionId;
    use crate::domain::template::PlaceholderType;

    fn session() -> Session {
        Session::new(
            SessionId::new(),
            "[Company Name] / [Signing Date] / [Email Address]",
            vec![
                PlaceholderDefinition::new("company_name", "Company Name", PlaceholderType::Text),
                PlaceholderDefinition::new("signing_date", "Signing Date", PlaceholderType::Date),
                PlaceholderDefinition::new("email_address", "Email Address", PlaceholderType::Email),
            ],
        )
        .unwrap()
    }

    fn raw(pairs: &[(&str, &str)]) -> RawExtraction {
        RawExtraction {
            understood: true,
            values: pairs.iter().map(|(k, v)| ExtractedPair::new(*k, *v)).collect(),
            acknowledgment: Some("Got it.".to_string()),
            needs_clarification: false,
        }
    }

    #[test]
    fn current_placeholder_wins_on_partial_match() {
        let mut s = session();
        s.ask("company_name", "Which company?").unwrap();
        assert_eq!(
            resolve_key(&s, "Company", s.current_placeholder_key()),
            Some(KeyResolution::Placeholder("company_name".to_string()))
        );
        assert_eq!(
            resolve_key(&s, "name", s.current_placeholder_key()),
            Some(KeyResolution::Placeholder("company_name".to_string()))
        );
    }

    #[test]
    fn exact_match_used_without_current_placeholder() {
        let s = session();
        assert_eq!(
            resolve_key(&s, "Signing Date", None),
            Some(KeyResolution::Placeholder("signing_date".to_string()))
        );
    }

    #[test]
    fn alias_key_used_by_template_still_resolves() {
        let s = session();
        assert_eq!(
            resolve_key(&s, "email address", None),
            Some(KeyResolution::Placeholder("email_address".to_string()))
        );
    }

    #[test]
    fn synonym_resolves_to_placeholder() {
        let s = session();
        assert_eq!(
            resolve_key(&s, "Business", None),
            Some(KeyResolution::Placeholder("company_name".to_string()))
        );
    }

    #[test]
    fn unknown_key_becomes_orphan() {
        let s = session();
        assert_eq!(
            resolve_key(&s, "Governing Law", None),
            Some(KeyResolution::Orphan("governing_law".to_string()))
        );
    }

    #[test]
    fn blank_key_binds_to_current_placeholder() {
        let mut s = session();
        assert_eq!(resolve_key(&s, "  ", None), None);
        s.ask("signing_date", "When?").unwrap();
        assert_eq!(
            resolve_key(&s, "", s.current_placeholder_key()),
            Some(KeyResolution::Placeholder("signing_date".to_string()))
        );
    }

    #[tokio::test]
    async fn fills_current_placeholder() {
        let lm = Arc::new(MockLanguageModel::new().with_extraction(raw(&[("company", "Acme Corp")])));
        let extractor = ValueExtractor::new(lm);
        let mut s = session();
        s.ask("company_name", "Which company?").unwrap();

        let result = extractor.extract(&mut s, "Acme Corp", ExtractionMode::FillOnly).await;

        assert!(result.is_confident());
        assert_eq!(result.filled_keys, vec!["company_name"]);
        assert_eq!(s.responses()["company_name"], "Acme Corp");
        assert_eq!(result.acknowledgment.as_deref(), Some("Got it."));
    }

    #[tokio::test]
    async fn fill_only_never_overwrites() {
        let lm = Arc::new(
            MockLanguageModel::new().with_extraction(raw(&[("company_name", "Globex")])),
        );
        let extractor = ValueExtractor::new(lm);
        let mut s = session();
        s.fill("company_name", "Acme Corp").unwrap();

        let result = extractor.extract(&mut s, "Globex", ExtractionMode::FillOnly).await;

        assert!(result.filled_keys.is_empty());
        assert!(result.extracted_values.is_empty());
        assert_eq!(s.responses()["company_name"], "Acme Corp");
    }

    #[tokio::test]
    async fn overwrite_mode_replaces_value() {
        let lm = Arc::new(
            MockLanguageModel::new().with_extraction(raw(&[("company_name", "Globex")])),
        );
        let extractor = ValueExtractor::new(lm);
        let mut s = session();
        s.fill("company_name", "Acme Corp").unwrap();

        let result = extractor
            .extract(&mut s, "Actually it's Globex", ExtractionMode::Overwrite)
            .await;

        assert_eq!(result.filled_keys, vec!["company_name"]);
        assert_eq!(s.responses()["company_name"], "Globex");
    }

    #[tokio::test]
    async fn orphans_are_stored_but_not_filled() {
        let lm = Arc::new(
            MockLanguageModel::new().with_extraction(raw(&[("governing law", "Delaware")])),
        );
        let extractor = ValueExtractor::new(lm);
        let mut s = session();

        let result = extractor.extract(&mut s, "Delaware law", ExtractionMode::FillOnly).await;

        assert!(result.filled_keys.is_empty());
        assert_eq!(result.orphan_keys, vec!["governing_law"]);
        assert_eq!(s.responses()["governing_law"], "Delaware");
        assert!(!s.is_complete());
    }

    #[tokio::test]
    async fn filled_key_leaves_skip_set() {
        let lm = Arc::new(
            MockLanguageModel::new().with_extraction(raw(&[("signing_date", "2024-03-01")])),
        );
        let extractor = ValueExtractor::new(lm);
        let mut s = session();
        s.skip("signing_date").unwrap();

        extractor.extract(&mut s, "March 1st 2024", ExtractionMode::FillOnly).await;

        assert!(s.skipped().is_empty());
    }

    #[tokio::test]
    async fn service_failure_needs_clarification() {
        let lm = Arc::new(MockLanguageModel::new().with_extraction_error(MockError::Unavailable {
            message: "down".to_string(),
        }));
        let extractor = ValueExtractor::new(lm);
        let mut s = session();

        let result = extractor.extract(&mut s, "Acme", ExtractionMode::FillOnly).await;

        assert!(!result.understood);
        assert!(result.needs_clarification);
        assert!(result.extracted_values.is_empty());
        assert!(s.responses().is_empty());
    }

    #[tokio::test]
    async fn prompt_lists_only_unfilled_placeholders() {
        let lm = Arc::new(MockLanguageModel::new().with_extraction(raw(&[])));
        let extractor = ValueExtractor::new(lm.clone());
        let mut s = session();
        s.fill("company_name", "Acme Corp").unwrap();

        extractor.extract(&mut s, "2024-01-01", ExtractionMode::FillOnly).await;

        let prompt = lm.last_prompt().unwrap();
        assert!(!prompt.user.contains("- company_name"));
        assert!(prompt.user.contains("- signing_date"));
        assert!(prompt.system.contains("Preserve the user's literal formatting"));
    }
}
