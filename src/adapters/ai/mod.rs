//! AI Adapters.
//!
//! Implementations of the AIProvider and LanguageModelService ports.
//!
//! ## Available Adapters
//!
//! - `OpenAIProvider` - OpenAI chat completions
//! - `AnthropicProvider` - Anthropic messages
//! - `MockAIProvider` - Scripted provider for testing
//! - `ProviderLanguageModel` - The four dialog capabilities over any provider
//! - `MockLanguageModel` - Scripted per-capability results for testing

mod anthropic_provider;
mod mock_language_model;
mod mock_provider;
mod openai_provider;
mod provider_language_model;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use mock_language_model::{Capability, MockLanguageModel};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
pub use provider_language_model::{parse_json_reply, ProviderLanguageModel};
