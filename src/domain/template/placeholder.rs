//! Placeholder definitions detected in a template.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of value a placeholder expects.
///
/// Drives the deterministic type check in the validator and is passed to the
/// language model as context when phrasing questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderType {
    /// Free text; only needs to be non-blank.
    #[default]
    Text,
    /// A plain number.
    Number,
    /// A monetary amount, symbols and digit grouping allowed.
    Currency,
    /// A calendar date.
    Date,
    /// An email address.
    Email,
    /// A postal address.
    Address,
    /// A signer's name or signature line.
    Signature,
}

impl PlaceholderType {
    /// Returns the lowercase wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Currency => "currency",
            Self::Date => "date",
            Self::Email => "email",
            Self::Address => "address",
            Self::Signature => "signature",
        }
    }

    /// Guesses a type from the words of a human-readable label.
    ///
    /// Falls back to `Text` when nothing in the label is telling.
    pub fn infer_from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        // Single words match whole words only ("age" must not match "manager").
        let has = |cues: &[&str]| {
            cues.iter().any(|cue| {
                if cue.chars().all(char::is_alphanumeric) {
                    words.contains(cue)
                } else {
                    lower.contains(cue)
                }
            })
        };

        if has(&["email", "e-mail"]) {
            Self::Email
        } else if has(&["phone", "fax", "mobile"]) {
            // Phone numbers carry punctuation that a numeric parse would reject.
            Self::Text
        } else if has(&["date", "dob", "birthday", "deadline"]) {
            Self::Date
        } else if has(&["signature", "signed by", "signatory"]) {
            Self::Signature
        } else if has(&["amount", "price", "fee", "salary", "cost", "payment", "rent", "$", "compensation"]) {
            Self::Currency
        } else if has(&["number of", "quantity", "count", "percent", "%", "age", "years"]) {
            Self::Number
        } else if has(&["address"]) {
            Self::Address
        } else {
            Self::Text
        }
    }
}

impl fmt::Display for PlaceholderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaceholderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "currency" => Ok(Self::Currency),
            "date" => Ok(Self::Date),
            "email" => Ok(Self::Email),
            "address" => Ok(Self::Address),
            "signature" => Ok(Self::Signature),
            other => Err(format!("unknown placeholder type: {}", other)),
        }
    }
}

/// A named blank in a template. Immutable once detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderDefinition {
    /// Stable identifier, lowercase with underscores.
    pub key: String,
    /// Human-readable name.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub placeholder_type: PlaceholderType,
    #[serde(default = "default_required")]
    pub required: bool,
    /// Verbatim marker found in the template, kept for document regeneration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_pattern: Option<String>,
}

fn default_required() -> bool {
    true
}

impl PlaceholderDefinition {
    /// Creates a required placeholder with no description.
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        placeholder_type: PlaceholderType,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            description: None,
            placeholder_type,
            required: true,
            original_pattern: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the placeholder as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Records the verbatim template marker.
    pub fn with_original_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.original_pattern = Some(pattern.into());
        self
    }
}
