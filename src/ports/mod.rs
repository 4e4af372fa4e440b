//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the dialog engine and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Raw chat completions from a hosted model
//! - `LanguageModelService` - Classify / extract / generate / validate capabilities
//! - `SessionStore` - Keyed session persistence
//! - `PlaceholderDetector` - Initial blank detection for a template

mod ai_provider;
mod language_model;
mod placeholder_detector;
mod session_store;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use language_model::{LanguageModelService, ModelPrompt};
pub use placeholder_detector::PlaceholderDetector;
pub use session_store::{SessionStore, SessionStoreError};
