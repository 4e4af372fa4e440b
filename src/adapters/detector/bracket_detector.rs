//! Regex-based placeholder detector.
//!
//! Finds blanks written as `[Label]` or `{{ key }}`. Markdown links and task
//! checkboxes are not blanks.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::template::{normalize_key, PlaceholderDefinition, PlaceholderType};
use crate::ports::PlaceholderDetector;

static SQUARE_BRACKET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\[\]\n]{1,80})\]").expect("valid bracket regex"));

static DOUBLE_BRACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_ .\-]{1,80}?)\s*\}\}").expect("valid brace regex"));

/// Detects `[Label]` and `{{ key }}` markers in definition order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketPlaceholderDetector;

impl BracketPlaceholderDetector {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous detection; the port method delegates here.
    pub fn scan(&self, template_text: &str) -> Vec<PlaceholderDefinition> {
        let mut found: Vec<(usize, PlaceholderDefinition)> = Vec::new();

        for caps in SQUARE_BRACKET.captures_iter(template_text) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            // `[text](url)` is a link
            if template_text[whole.end()..].starts_with('(') {
                continue;
            }
            let label = inner.as_str().trim();
            if let Some(def) = definition(label, whole.as_str()) {
                found.push((whole.start(), def));
            }
        }

        for caps in DOUBLE_BRACE.captures_iter(template_text) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let label = humanize(inner.as_str());
            if let Some(def) = definition(&label, whole.as_str()) {
                found.push((whole.start(), def));
            }
        }

        found.sort_by_key(|(pos, _)| *pos);

        let mut placeholders: Vec<PlaceholderDefinition> = Vec::new();
        for (_, def) in found {
            if !placeholders.iter().any(|p| p.key == def.key) {
                placeholders.push(def);
            }
        }
        placeholders
    }
}

#[async_trait]
impl PlaceholderDetector for BracketPlaceholderDetector {
    async fn detect(&self, template_text: &str) -> Result<Vec<PlaceholderDefinition>, DomainError> {
        if template_text.trim().is_empty() {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "Template text is empty",
            ));
        }
        Ok(self.scan(template_text))
    }
}

/// Builds a definition for a label, or `None` when the marker is not a blank.
fn definition(label: &str, pattern: &str) -> Option<PlaceholderDefinition> {
    if !label.chars().any(char::is_alphabetic) || is_checkbox(label) {
        return None;
    }
    let key = key_for_label(label);
    if key.is_empty() {
        return None;
    }
    Some(
        PlaceholderDefinition::new(key, label, PlaceholderType::infer_from_label(label))
            .with_original_pattern(pattern),
    )
}

fn is_checkbox(label: &str) -> bool {
    matches!(label, "x" | "X")
}

/// Lowercase underscored key with punctuation dropped.
pub fn key_for_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() => Some(c),
            '_' | '-' | '/' | '.' => Some(' '),
            c if c.is_whitespace() => Some(' '),
            _ => None,
        })
        .collect();
    normalize_key(&cleaned)
}

/// `client_name` → `Client Name`
fn humanize(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
