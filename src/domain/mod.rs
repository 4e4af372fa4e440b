//! Domain layer containing the dialog engine and its types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors)
//! - `template` - Placeholder definitions and the session aggregate
//! - `dialog` - Turn handling: classification, extraction, validation, questions

pub mod dialog;
pub mod foundation;
pub mod template;
