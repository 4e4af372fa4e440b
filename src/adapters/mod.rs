//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the dialog engine to external systems:
//! - `ai` - Language model providers and the capability adapter
//! - `detector` - Placeholder detection in template text
//! - `storage` - Session persistence

pub mod ai;
pub mod detector;
pub mod storage;

pub use ai::{
    AnthropicConfig, AnthropicProvider, MockAIProvider, MockLanguageModel, OpenAIConfig,
    OpenAIProvider, ProviderLanguageModel,
};
pub use detector::BracketPlaceholderDetector;
pub use storage::InMemorySessionStore;
