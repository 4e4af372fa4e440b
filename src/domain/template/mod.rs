//! Template module - placeholders and the fill-in session aggregate.

mod keys;
mod placeholder;
mod session;

pub use keys::{key_candidates, normalize_key, synonym_for, KEY_SYNONYMS};
pub use placeholder::{PlaceholderDefinition, PlaceholderType};
pub use session::{DialogState, PendingQuestion, Session};
