//! Dialog module - turn classification, extraction, validation and phrasing.
//!
//! # Components
//!
//! - `classifier` - Routes a turn to one of six handlers
//! - `extractor` - Maps a turn to placeholder values and writes them
//! - `validator` - Type check plus model plausibility check
//! - `question` - Picks and phrases the next question
//! - `explanation` - Answers meta-questions, filtered for follow-ups
//! - `orchestrator` - The per-turn state machine tying it together

mod classifier;
mod context;
mod explanation;
mod extractor;
mod follow_up;
mod orchestrator;
mod question;
mod settings;
mod validator;
mod values;

pub use classifier::{is_skip_command, IntentClassifier, SKIP_COMMANDS};
pub use context::TurnContext;
pub use explanation::{ExplanationGenerator, EXPLANATION_FALLBACK};
pub use extractor::{resolve_key, ExtractionMode, KeyResolution, ValueExtractor};
pub use follow_up::{
    starts_with_interrogative, FollowUpFilter, FOLLOW_UP_FALLBACK, INTERROGATIVE_CUES,
    TRAILING_OFFERS,
};
pub use orchestrator::{
    is_affirmative, refers_to_last_question, DialogEngine, AFFIRMATIVE_PHRASES,
    LAST_QUESTION_CUES,
};
pub use question::{fallback_question, QuestionGenerator, COMPLETION_MESSAGE};
pub use settings::{DialogSettings, InvalidValuePolicy};
pub use validator::{
    parse_amount, parse_date, type_check, Validator, EMPTY_VALUE, INVALID_CURRENCY,
    INVALID_DATE, INVALID_EMAIL, INVALID_NUMBER, MIN_ADDRESS_LEN, NEGATIVE_AMOUNT,
    SHORT_ADDRESS,
};
pub use values::{
    Classification, ExtractedPair, ExtractionResult, PlausibilityReport, QueryType,
    RawExtraction, TurnResponse, ValidationResult,
};
