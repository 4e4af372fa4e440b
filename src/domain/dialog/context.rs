//! Read-only view of a session handed to the dialog components for one call.

use crate::domain::foundation::SessionId;
use crate::domain::template::Session;

/// What a component may know about the conversation so far.
#[derive(Debug, Clone)]
pub struct TurnContext<'a> {
    pub session_id: SessionId,
    pub last_question: Option<&'a str>,
    pub current_key: Option<&'a str>,
    pub filled_keys: Vec<&'a str>,
}

impl<'a> TurnContext<'a> {
    pub fn from_session(session: &'a Session) -> Self {
        Self {
            session_id: *session.id(),
            last_question: session.last_question_text(),
            current_key: session.current_placeholder_key(),
            filled_keys: session.filled_keys(),
        }
    }

    /// Renders the context as prompt lines.
    pub(crate) fn describe(&self) -> String {
        let mut out = String::new();
        if let Some(q) = self.last_question {
            out.push_str(&format!("Last question asked: {}\n", q));
        }
        if let Some(key) = self.current_key {
            out.push_str(&format!("Current placeholder: {}\n", key));
        }
        if self.filled_keys.is_empty() {
            out.push_str("Already filled: none\n");
        } else {
            out.push_str(&format!("Already filled: {}\n", self.filled_keys.join(", ")));
        }
        out
    }
}
