//! Value types exchanged between the dialog components.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Purpose of a user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// The user supplies one or more values.
    Answer,
    /// The user asks about the document or the process.
    Question,
    /// The user is unsure what is being asked.
    Clarification,
    /// The user changes a value given earlier.
    Correction,
    /// The user wants to come back to the current placeholder later.
    Skip,
    /// Anything else (greetings, confirmations, chatter).
    General,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answer => "answer",
            Self::Question => "question",
            Self::Clarification => "clarification",
            Self::Correction => "correction",
            Self::Skip => "skip",
            Self::General => "general",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label for one user turn. Not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub query_type: QueryType,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

fn full_confidence() -> f32 {
    1.0
}

impl Classification {
    pub fn new(query_type: QueryType, confidence: f32) -> Self {
        Self {
            query_type,
            confidence,
            reasoning: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Classification used when the model cannot be trusted: treat as progress.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self::new(QueryType::Answer, 0.0).with_reasoning(reason)
    }
}

/// One key/value pair as the model reported it, before key resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPair {
    pub key: String,
    pub value: String,
}

impl ExtractedPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Structured output of the model's extract capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawExtraction {
    pub understood: bool,
    pub values: Vec<ExtractedPair>,
    pub acknowledgment: Option<String>,
    pub needs_clarification: bool,
}

/// What the extractor made of a turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub understood: bool,
    /// Resolved key to value, orphans included.
    pub extracted_values: BTreeMap<String, String>,
    /// Placeholder keys written to the session this turn.
    pub filled_keys: Vec<String>,
    /// Keys that matched no placeholder.
    pub orphan_keys: Vec<String>,
    pub acknowledgment: Option<String>,
    pub needs_clarification: bool,
}

impl ExtractionResult {
    /// Result for a failed model call: nothing understood, ask again.
    pub fn failed() -> Self {
        Self {
            understood: false,
            needs_clarification: true,
            ..Self::default()
        }
    }

    /// True when the turn actually moved at least one placeholder forward.
    pub fn is_confident(&self) -> bool {
        self.understood && !self.needs_clarification && !self.filled_keys.is_empty()
    }
}

/// Structured output of the model's validate capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlausibilityReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Outcome of validating one value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    pub fn from_parts(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            suggestions: Vec::new(),
        }
    }

    /// Folds a plausibility report in. Existing errors are kept; duplicates are dropped.
    pub fn merge(mut self, report: PlausibilityReport) -> Self {
        fn extend_unique(into: &mut Vec<String>, from: Vec<String>) {
            for item in from {
                let item = item.trim().to_string();
                if !item.is_empty() && !into.contains(&item) {
                    into.push(item);
                }
            }
        }

        extend_unique(&mut self.errors, report.errors);
        extend_unique(&mut self.warnings, report.warnings);
        extend_unique(&mut self.suggestions, report.suggestions);
        self.is_valid = self.errors.is_empty();
        self
    }
}

/// Envelope returned for every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub message: String,
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_values: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_clarification: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<QueryType>,
    /// Validation outcome per extracted placeholder key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub validation: BTreeMap<String, ValidationResult>,
}

impl TurnResponse {
    pub fn new(message: impl Into<String>, is_complete: bool) -> Self {
        Self {
            message: message.into(),
            is_complete,
            extracted_values: None,
            needs_clarification: None,
            query_type: None,
            validation: BTreeMap::new(),
        }
    }

    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = Some(query_type);
        self
    }

    pub fn with_extracted_values(mut self, values: BTreeMap<String, String>) -> Self {
        if !values.is_empty() {
            self.extracted_values = Some(values);
        }
        self
    }

    pub fn with_needs_clarification(mut self, needs: bool) -> Self {
        self.needs_clarification = Some(needs);
        self
    }

    pub fn with_validation(mut self, validation: BTreeMap<String, ValidationResult>) -> Self {
        self.validation = validation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_defaults_confidence_when_missing() {
        let c: Classification = serde_json::from_str(r#"{"queryType":"skip"}"#).unwrap();
        assert_eq!(c.query_type, QueryType::Skip);
        assert_eq!(c.confidence, 1.0);
    }

    #[test]
    fn fallback_classification_is_an_answer() {
        let c = Classification::fallback("service down");
        assert_eq!(c.query_type, QueryType::Answer);
        assert_eq!(c.reasoning.as_deref(), Some("service down"));
    }

    #[test]
    fn raw_extraction_tolerates_missing_fields() {
        let raw: RawExtraction =
            serde_json::from_str(r#"{"understood":true,"values":[{"key":"Company","value":"Acme"}]}"#)
                .unwrap();
        assert!(raw.understood);
        assert!(!raw.needs_clarification);
        assert_eq!(raw.values[0], ExtractedPair::new("Company", "Acme"));
    }

    #[test]
    fn failed_extraction_needs_clarification() {
        let result = ExtractionResult::failed();
        assert!(!result.understood);
        assert!(result.needs_clarification);
        assert!(result.extracted_values.is_empty());
        assert!(!result.is_confident());
    }

    #[test]
    fn merge_keeps_existing_errors() {
        let stage_one = ValidationResult::from_parts(vec!["Invalid email format".into()], vec![]);
        let merged = stage_one.merge(PlausibilityReport {
            errors: vec![],
            warnings: vec!["Looks like a placeholder address".into()],
            suggestions: vec!["Use a real mailbox".into()],
        });

        assert!(!merged.is_valid);
        assert_eq!(merged.errors, vec!["Invalid email format"]);
        assert_eq!(merged.warnings.len(), 1);
        assert_eq!(merged.suggestions.len(), 1);
    }

    #[test]
    fn merge_dedupes_and_can_invalidate() {
        let merged = ValidationResult::from_parts(vec![], vec!["Short".into()]).merge(
            PlausibilityReport {
                errors: vec!["Date is in the distant past".into()],
                warnings: vec!["Short".into()],
                suggestions: vec![],
            },
        );
        assert!(!merged.is_valid);
        assert_eq!(merged.warnings, vec!["Short"]);
    }

    #[test]
    fn turn_response_serializes_camel_case_and_skips_empty() {
        let response = TurnResponse::new("Thanks!", false)
            .with_query_type(QueryType::Answer)
            .with_needs_clarification(false)
            .with_extracted_values(BTreeMap::new());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["isComplete"], false);
        assert_eq!(json["queryType"], "answer");
        assert_eq!(json["needsClarification"], false);
        assert!(json.get("extractedValues").is_none());
        assert!(json.get("validation").is_none());
    }
}
