//! Placeholder Detector Adapters
//!
//! - **BracketPlaceholderDetector** - `[Label]` and `{{ key }}` markers

mod bracket_detector;

pub use bracket_detector::{key_for_label, BracketPlaceholderDetector};
