//! Two-stage value validation.
//!
//! Stage 1 is a deterministic type check and is authoritative. Stage 2 asks
//! the language model whether the value is plausible for the placeholder; its
//! findings are added on top and its failure is never fatal.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::values::ValidationResult;
use crate::domain::foundation::SessionId;
use crate::domain::template::{PlaceholderDefinition, PlaceholderType};
use crate::ports::{LanguageModelService, ModelPrompt};

pub const EMPTY_VALUE: &str = "Value cannot be empty";
pub const INVALID_EMAIL: &str = "Invalid email format";
pub const INVALID_DATE: &str = "Invalid date format";
pub const INVALID_NUMBER: &str = "Invalid number format";
pub const INVALID_CURRENCY: &str = "Invalid currency amount";
pub const SHORT_ADDRESS: &str = "Address looks incomplete";
pub const NEGATIVE_AMOUNT: &str = "Amount is negative";

/// Addresses shorter than this (in characters) get a warning.
pub const MIN_ADDRESS_LEN: usize = 10;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("valid ordinal regex"));

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const VALIDATE_SYSTEM_PROMPT: &str = "You check whether a value is plausible for a blank in a document template.\n\
Report only real problems; formatting the user chose on purpose is fine.\n\
Respond with JSON only: {\"errors\": [\"...\"], \"warnings\": [\"...\"], \"suggestions\": [\"...\"]}";

/// Parses a date written in any of the accepted forms.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    let cleaned = ORDINAL_SUFFIX.replace_all(trimmed, "$1").replace(',', " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
}

/// Parses a number after dropping everything but digits, separators and `-`.
///
/// Commas alone, or a repeated `.`, are grouping. When both separators appear
/// the last one is the decimal mark, so `1.234,50` and `1,234.50` agree.
pub fn parse_amount(value: &str) -> Option<f64> {
    let kept: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let dots = kept.matches('.').count();
    let commas = kept.matches(',').count();
    let decimal = match (dots, commas) {
        (1, 0) => Some('.'),
        (_, 0) | (0, _) => None,
        _ => kept.chars().rev().find(|c| matches!(c, '.' | ',')),
    };

    let normalized: String = kept
        .chars()
        .filter_map(|c| match c {
            '.' | ',' if Some(c) == decimal => Some('.'),
            '.' | ',' => None,
            other => Some(other),
        })
        .collect();
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Deterministic stage-1 check for a value against its placeholder type.
pub fn type_check(placeholder: &PlaceholderDefinition, value: &str) -> ValidationResult {
    let value = value.trim();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if value.is_empty() {
        errors.push(EMPTY_VALUE.to_string());
        return ValidationResult::from_parts(errors, warnings);
    }

    match placeholder.placeholder_type {
        PlaceholderType::Email => {
            if !EMAIL_PATTERN.is_match(value) {
                errors.push(INVALID_EMAIL.to_string());
            }
        }
        PlaceholderType::Date => {
            if parse_date(value).is_none() {
                errors.push(INVALID_DATE.to_string());
            }
        }
        PlaceholderType::Number => {
            if parse_amount(value).is_none() {
                errors.push(INVALID_NUMBER.to_string());
            }
        }
        PlaceholderType::Currency => match parse_amount(value) {
            None => errors.push(INVALID_CURRENCY.to_string()),
            Some(n) if n < 0.0 => warnings.push(NEGATIVE_AMOUNT.to_string()),
            Some(_) => {}
        },
        PlaceholderType::Address => {
            if value.chars().count() < MIN_ADDRESS_LEN {
                warnings.push(SHORT_ADDRESS.to_string());
            }
        }
        PlaceholderType::Text | PlaceholderType::Signature => {}
    }

    ValidationResult::from_parts(errors, warnings)
}

/// Validates values against their placeholder definitions.
pub struct Validator {
    language_model: Arc<dyn LanguageModelService>,
    plausibility_check: bool,
}

impl Validator {
    pub fn new(language_model: Arc<dyn LanguageModelService>, plausibility_check: bool) -> Self {
        Self {
            language_model,
            plausibility_check,
        }
    }

    /// Runs both stages. Stage-1 errors always survive.
    pub async fn validate(
        &self,
        session_id: SessionId,
        placeholder: &PlaceholderDefinition,
        value: &str,
    ) -> ValidationResult {
        let stage_one = type_check(placeholder, value);
        if !self.plausibility_check {
            return stage_one;
        }

        let mut facts = format!(
            "Label: {}\nType: {}\n",
            placeholder.label, placeholder.placeholder_type
        );
        if let Some(desc) = &placeholder.description {
            facts.push_str(&format!("Description: {}\n", desc));
        }
        facts.push_str(&format!("Value: {}", value.trim()));

        let prompt = ModelPrompt::new(VALIDATE_SYSTEM_PROMPT, facts)
            .for_session(session_id)
            .with_temperature(0.0)
            .with_max_tokens(300);

        match self.language_model.validate(prompt).await {
            Ok(report) => stage_one.merge(report),
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    placeholder = %placeholder.key,
                    error = %e,
                    "plausibility check failed, keeping type check result"
                );
                stage_one
            }
        }
    }
}
