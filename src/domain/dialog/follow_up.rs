//! Follow-up filter for explanation replies.
//!
//! Explanations must never end with a question of their own: the user is
//! always looking at exactly one open question, the one about the current
//! placeholder. The filter runs two passes over the model's text:
//!
//! 1. For every `?`, look back to the nearest `.` or `!`. If the fragment in
//!    between opens with an interrogative cue, everything from there on is
//!    dropped; otherwise only that fragment goes. With no boundary at all, an
//!    interrogative prefix empties the text and anything else keeps its words
//!    with a `.` in place of the `?`.
//! 2. Known trailing offers ("let me know if you have other questions", ...)
//!    are stripped and the sentence is closed with a period.
//!
//! An empty result becomes [`FOLLOW_UP_FALLBACK`].

use once_cell::sync::Lazy;
use regex::Regex;

/// Substituted when nothing survives filtering.
pub const FOLLOW_UP_FALLBACK: &str = "I've noted that.";

/// Words that open a question.
pub const INTERROGATIVE_CUES: &[&str] = &[
    "what", "which", "who", "whom", "whose", "when", "where", "why", "how", "would", "could",
    "can", "do", "does", "did", "is", "are", "was", "were", "will", "shall", "should", "may",
    "might", "have", "has", "any", "anything", "want", "ready",
];

/// Trailing offers to keep talking, matched at the end of the text.
pub const TRAILING_OFFERS: &[&str] = &[
    r"(?i)[,;:\s]*\b(?:let me know|feel free to (?:ask|reach out)|just ask) if you have any (?:other |more |further )?questions\b[^.!?]*[.!?]*\s*$",
    r"(?i)[,;:\s]*\b(?:do you have|have you got) any (?:other |more |further )?questions\b[^.!?]*[.!?]*\s*$",
    r"(?i)[,;:\s]*\b(?:would|do) you (?:like|want) to (?:continue|proceed|move on|keep going)\b[^.!?]*[.!?]*\s*$",
    r"(?i)[,;:\s]*\b(?:shall|should) we (?:continue|proceed|move on|keep going)\b[^.!?]*[.!?]*\s*$",
    r"(?i)[,;:\s]*\b(?:is there )?anything else (?:i can help|you'd like|you would like|you need)\b[^.!?]*[.!?]*\s*$",
    r"(?i)[,;:\s]*\b(?:are you )?ready to (?:continue|proceed|move on)\b[^.!?]*[.!?]*\s*$",
];

static TRAILING_OFFER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    TRAILING_OFFERS
        .iter()
        .map(|p| Regex::new(p).expect("valid trailing offer regex"))
        .collect()
});

/// Strips unanswered follow-up questions from model-written explanations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowUpFilter;

impl FollowUpFilter {
    pub fn new() -> Self {
        Self
    }

    /// Runs both passes and substitutes the fallback for an empty result.
    pub fn apply(&self, raw: &str) -> String {
        let text = strip_questions(raw.trim());
        let text = strip_trailing_offers(&text);
        if text.trim().is_empty() {
            FOLLOW_UP_FALLBACK.to_string()
        } else {
            text
        }
    }
}

/// True if the fragment's first word is an interrogative cue.
pub fn starts_with_interrogative(fragment: &str) -> bool {
    let first_word = fragment
        .trim_start()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .next()
        .unwrap_or("")
        .to_lowercase();
    INTERROGATIVE_CUES.contains(&first_word.as_str())
}

fn strip_questions(text: &str) -> String {
    let mut out = text.to_string();

    while let Some(q) = out.find('?') {
        match out[..q].rfind(|c: char| c == '.' || c == '!') {
            Some(boundary) => {
                if starts_with_interrogative(&out[boundary + 1..q]) {
                    out.truncate(boundary + 1);
                } else {
                    let tail = out[q + 1..].to_string();
                    out.truncate(boundary + 1);
                    out.push_str(&tail);
                }
            }
            None => {
                if starts_with_interrogative(&out[..q]) {
                    out.clear();
                } else {
                    out.replace_range(q..q + 1, ".");
                }
            }
        }
        out = out.trim().to_string();
    }

    out
}

fn strip_trailing_offers(text: &str) -> String {
    let mut out = text.to_string();
    let mut removed = false;

    loop {
        let Some(start) = TRAILING_OFFER_PATTERNS
            .iter()
            .find_map(|re| re.find(&out).map(|m| m.start()))
        else {
            break;
        };
        out.truncate(start);
        removed = true;
    }

    if removed {
        out = out
            .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-'))
            .to_string();
        if !out.is_empty() && !out.ends_with(|c: char| c == '.' || c == '!') {
            out.push('.');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(text: &str) -> String {
        FollowUpFilter::new().apply(text)
    }

    #[test]
    fn text_without_questions_is_only_trimmed() {
        assert_eq!(
            filter("  The effective date is when the agreement starts.  "),
            "The effective date is when the agreement starts."
        );
    }

    #[test]
    fn trailing_interrogative_sentence_is_dropped() {
        assert_eq!(
            filter("The signing date is the day both parties sign. Would you like an example?"),
            "The signing date is the day both parties sign."
        );
    }

    #[test]
    fn everything_after_an_interrogative_sentence_goes() {
        assert_eq!(
            filter("It names the seller. What else? Nothing more to add."),
            "It names the seller."
        );
    }

    #[test]
    fn non_interrogative_fragment_is_dropped_alone() {
        assert_eq!(
            filter("Good point. You mean the start date? It is the effective date."),
            "Good point. It is the effective date."
        );
    }

    #[test]
    fn whole_question_falls_back() {
        assert_eq!(filter("What else can I help you with?"), FOLLOW_UP_FALLBACK);
    }

    #[test]
    fn non_interrogative_prefix_without_boundary_keeps_words() {
        assert_eq!(filter("The legal name, right?"), "The legal name, right.");
    }

    #[test]
    fn trailing_offer_is_stripped_and_terminated() {
        assert_eq!(
            filter("That is the company's registered name, let me know if you have any other questions."),
            "That is the company's registered name."
        );
    }

    #[test]
    fn offer_without_question_mark_is_stripped() {
        assert_eq!(
            filter("This is the closing date. Do you have any other questions"),
            "This is the closing date."
        );
    }

    #[test]
    fn stacked_offers_are_all_stripped() {
        assert_eq!(
            filter("Rent is due monthly. Let me know if you have any questions. Ready to continue"),
            "Rent is due monthly."
        );
    }

    #[test]
    fn empty_input_falls_back() {
        assert_eq!(filter("   "), FOLLOW_UP_FALLBACK);
    }

    #[test]
    fn cue_detection_ignores_case_and_leading_space() {
        assert!(starts_with_interrogative("  Would you"));
        assert!(starts_with_interrogative("IS it"));
        assert!(!starts_with_interrogative("You mean"));
        assert!(!starts_with_interrogative(""));
    }
}
