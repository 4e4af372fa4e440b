//! Session aggregate - the evolving record of one template's fill-in conversation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::placeholder::PlaceholderDefinition;
use crate::domain::foundation::{DomainError, ErrorCode, SessionId, Timestamp};

/// The question currently in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuestion {
    pub placeholder_key: String,
    /// Verbatim text of the last question asked, if one was phrased.
    pub question: Option<String>,
}

impl PendingQuestion {
    pub fn new(placeholder_key: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            placeholder_key: placeholder_key.into(),
            question: Some(question.into()),
        }
    }
}

/// Where the conversation stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DialogState {
    /// Unfilled placeholders remain; `pending` is the last question asked.
    Collecting { pending: Option<PendingQuestion> },
    /// The last reply was not understood and the same question was re-asked.
    AwaitingClarification { pending: PendingQuestion },
    /// Every placeholder has a value. Terminal.
    Complete,
}

impl Default for DialogState {
    fn default() -> Self {
        Self::Collecting { pending: None }
    }
}

impl DialogState {
    pub fn pending(&self) -> Option<&PendingQuestion> {
        match self {
            Self::Collecting { pending } => pending.as_ref(),
            Self::AwaitingClarification { pending } => Some(pending),
            Self::Complete => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Session aggregate.
///
/// # Invariants
///
/// - Placeholder keys are unique and fixed after creation
/// - `skipped` and `held` only contain placeholder keys that are unfilled
/// - A filled placeholder is never overwritten except through [`Session::overwrite`]
/// - Once the state is `Complete`, every mutator is rejected
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: SessionId,
    template_text: String,
    placeholders: Vec<PlaceholderDefinition>,
    /// Placeholder values plus orphan entries keyed by their raw normalized key.
    responses: BTreeMap<String, String>,
    skipped: BTreeSet<String>,
    /// Values that failed validation and wait for the user to confirm them.
    held: BTreeMap<String, String>,
    state: DialogState,
    /// Running acknowledgments fed to the question generator only.
    question_context: Vec<String>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Session {
    /// Creates a session over detected placeholders.
    ///
    /// # Errors
    ///
    /// - `NoPlaceholders` if the detector found nothing
    /// - `DuplicatePlaceholder` if two definitions share a key
    pub fn new(
        id: SessionId,
        template_text: impl Into<String>,
        placeholders: Vec<PlaceholderDefinition>,
    ) -> Result<Self, DomainError> {
        if placeholders.is_empty() {
            return Err(DomainError::new(
                ErrorCode::NoPlaceholders,
                "Template contains no placeholders",
            ));
        }

        let mut seen = HashSet::new();
        for def in &placeholders {
            if !seen.insert(def.key.as_str()) {
                return Err(DomainError::new(
                    ErrorCode::DuplicatePlaceholder,
                    format!("Placeholder key '{}' is defined more than once", def.key),
                )
                .with_detail("key", def.key.clone()));
            }
        }

        let now = Timestamp::now();
        Ok(Self {
            id,
            template_text: template_text.into(),
            placeholders,
            responses: BTreeMap::new(),
            skipped: BTreeSet::new(),
            held: BTreeMap::new(),
            state: DialogState::default(),
            question_context: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn template_text(&self) -> &str {
        &self.template_text
    }

    pub fn placeholders(&self) -> &[PlaceholderDefinition] {
        &self.placeholders
    }

    pub fn responses(&self) -> &BTreeMap<String, String> {
        &self.responses
    }

    pub fn skipped(&self) -> &BTreeSet<String> {
        &self.skipped
    }

    pub fn held(&self) -> &BTreeMap<String, String> {
        &self.held
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn question_context(&self) -> &[String] {
        &self.question_context
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn placeholder(&self, key: &str) -> Option<&PlaceholderDefinition> {
        self.placeholders.iter().find(|p| p.key == key)
    }

    /// Key of the placeholder the last question was about.
    pub fn current_placeholder_key(&self) -> Option<&str> {
        self.state.pending().map(|p| p.placeholder_key.as_str())
    }

    /// Verbatim text of the last question asked.
    pub fn last_question_text(&self) -> Option<&str> {
        self.state.pending().and_then(|p| p.question.as_deref())
    }

    pub fn is_filled(&self, key: &str) -> bool {
        self.placeholder(key).is_some()
            && self
                .responses
                .get(key)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false)
    }

    /// True when every placeholder key has a non-blank response.
    ///
    /// Orphan entries do not count.
    pub fn is_complete(&self) -> bool {
        self.placeholders.iter().all(|p| self.is_filled(&p.key))
    }

    /// Placeholder keys with a non-blank value, in definition order.
    pub fn filled_keys(&self) -> Vec<&str> {
        self.placeholders
            .iter()
            .filter(|p| self.is_filled(&p.key))
            .map(|p| p.key.as_str())
            .collect()
    }

    /// Values for known placeholders only, in definition order.
    pub fn filled_values(&self) -> Vec<(&PlaceholderDefinition, &str)> {
        self.placeholders
            .iter()
            .filter_map(|p| {
                self.responses
                    .get(&p.key)
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (p, v.as_str()))
            })
            .collect()
    }

    pub fn unfilled(&self) -> Vec<&PlaceholderDefinition> {
        self.placeholders
            .iter()
            .filter(|p| !self.is_filled(&p.key))
            .collect()
    }

    /// The placeholder the next question should target.
    ///
    /// Unfilled non-skipped placeholders come first in definition order,
    /// then skipped ones in definition order.
    pub fn next_target(&self) -> Option<&PlaceholderDefinition> {
        let unfilled = self.unfilled();
        unfilled
            .iter()
            .find(|p| !self.skipped.contains(&p.key))
            .or_else(|| unfilled.first())
            .copied()
    }

    // ───────────────────────────────────────────────────────────────
    // Mutators
    // ───────────────────────────────────────────────────────────────

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.state.is_complete() {
            return Err(DomainError::session_complete());
        }
        Ok(())
    }

    fn ensure_known(&self, key: &str) -> Result<(), DomainError> {
        if self.placeholder(key).is_none() {
            return Err(DomainError::unknown_placeholder(key));
        }
        Ok(())
    }

    /// Fills an unfilled placeholder.
    ///
    /// Returns `Ok(false)` without changes when the placeholder already has a
    /// value or the value is blank.
    pub fn fill(&mut self, key: &str, value: impl Into<String>) -> Result<bool, DomainError> {
        self.ensure_open()?;
        self.ensure_known(key)?;

        let value = value.into();
        if self.is_filled(key) || value.trim().is_empty() {
            return Ok(false);
        }

        self.responses.insert(key.to_string(), value);
        self.skipped.remove(key);
        self.held.remove(key);
        self.touch();
        Ok(true)
    }

    /// Replaces the value of a placeholder, filled or not.
    ///
    /// Returns `Ok(false)` for a blank value or a value equal to the current one.
    pub fn overwrite(&mut self, key: &str, value: impl Into<String>) -> Result<bool, DomainError> {
        self.ensure_open()?;
        self.ensure_known(key)?;

        let value = value.into();
        if value.trim().is_empty() || self.responses.get(key) == Some(&value) {
            return Ok(false);
        }

        self.responses.insert(key.to_string(), value);
        self.skipped.remove(key);
        self.held.remove(key);
        self.touch();
        Ok(true)
    }

    /// Stores a value under a key that matches no placeholder.
    ///
    /// Returns `Ok(false)` if the key names a placeholder, the value is blank,
    /// or an orphan with that key already exists.
    pub fn record_orphan(&mut self, key: &str, value: impl Into<String>) -> Result<bool, DomainError> {
        self.ensure_open()?;

        let value = value.into();
        if self.placeholder(key).is_some()
            || value.trim().is_empty()
            || self.responses.contains_key(key)
        {
            return Ok(false);
        }

        self.responses.insert(key.to_string(), value);
        self.touch();
        Ok(true)
    }

    /// Defers an unfilled placeholder to the end of the queue.
    ///
    /// Returns `Ok(true)` if the key was newly added to the skip set.
    pub fn skip(&mut self, key: &str) -> Result<bool, DomainError> {
        self.ensure_open()?;
        self.ensure_known(key)?;

        if self.is_filled(key) {
            return Ok(false);
        }

        let added = self.skipped.insert(key.to_string());
        if added {
            self.touch();
        }
        Ok(added)
    }

    /// Moves a filled value out of `responses` until the user confirms it.
    pub fn hold(&mut self, key: &str) -> Result<Option<String>, DomainError> {
        self.ensure_open()?;
        self.ensure_known(key)?;

        let value = self.responses.remove(key);
        if let Some(v) = &value {
            self.held.insert(key.to_string(), v.clone());
            self.touch();
        }
        Ok(value)
    }

    /// Commits every held value whose placeholder is still unfilled.
    ///
    /// Returns the committed keys in key order.
    pub fn commit_held(&mut self) -> Result<Vec<String>, DomainError> {
        self.ensure_open()?;

        let held = std::mem::take(&mut self.held);
        let mut committed = Vec::new();
        for (key, value) in held {
            if self.fill(&key, value)? {
                committed.push(key);
            }
        }
        Ok(committed)
    }

    /// Records a question about `key` as the one in flight.
    pub fn ask(&mut self, key: &str, question: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.ensure_known(key)?;

        self.state = DialogState::Collecting {
            pending: Some(PendingQuestion::new(key, question)),
        };
        self.touch();
        Ok(())
    }

    /// Points the conversation at `key` without changing the last question text.
    ///
    /// Returns `Ok(false)` when the placeholder is already filled.
    pub fn focus(&mut self, key: &str) -> Result<bool, DomainError> {
        self.ensure_open()?;
        self.ensure_known(key)?;

        if self.is_filled(key) {
            return Ok(false);
        }

        let question = self.last_question_text().map(str::to_string);
        self.state = DialogState::Collecting {
            pending: Some(PendingQuestion {
                placeholder_key: key.to_string(),
                question,
            }),
        };
        self.touch();
        Ok(true)
    }

    /// Marks the pending question as re-asked after a reply that was not understood.
    ///
    /// Returns `false` when no question is pending.
    pub fn await_clarification(&mut self) -> bool {
        let pending = match &self.state {
            DialogState::Collecting { pending: Some(p) } => p.clone(),
            DialogState::AwaitingClarification { .. } => return true,
            _ => return false,
        };
        self.state = DialogState::AwaitingClarification { pending };
        self.touch();
        true
    }

    /// Appends an acknowledgment to the question generator's context, keeping
    /// at most `limit` entries.
    pub fn record_acknowledgment(&mut self, text: &str, limit: usize) {
        let text = text.trim();
        if text.is_empty() || self.state.is_complete() {
            return;
        }
        self.question_context.push(text.to_string());
        if self.question_context.len() > limit {
            let excess = self.question_context.len() - limit;
            self.question_context.drain(..excess);
        }
    }

    /// Moves to `Complete` if every placeholder is filled.
    ///
    /// Returns whether the session is now complete.
    pub fn refresh_completion(&mut self) -> bool {
        if self.state.is_complete() {
            return true;
        }
        if self.is_complete() {
            self.state = DialogState::Complete;
            self.held.clear();
            self.touch();
            return true;
        }
        false
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
