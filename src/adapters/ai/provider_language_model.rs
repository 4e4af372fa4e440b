//! Language Model Service on top of a chat-completion provider.
//!
//! Structured capabilities get a strict-output instruction appended to the
//! system prompt, and the first JSON object in the reply (bare or inside a
//! code fence) is deserialized. Anything that does not parse is an
//! `AIError::Parse`, which the dialog components treat like any other
//! service failure.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::domain::dialog::{Classification, PlausibilityReport, RawExtraction};
use crate::ports::{
    AIError, AIProvider, CompletionRequest, LanguageModelService, MessageRole, ModelPrompt,
    RequestMetadata,
};

const JSON_ONLY_INSTRUCTION: &str =
    "Return exactly one JSON object and nothing else: no prose, no markdown.";

/// Adapts any [`AIProvider`] to the [`LanguageModelService`] port.
pub struct ProviderLanguageModel<P: AIProvider> {
    provider: P,
}

impl<P: AIProvider> ProviderLanguageModel<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn to_request(&self, capability: &str, prompt: ModelPrompt, structured: bool) -> CompletionRequest {
        let system = if structured {
            format!("{}\n\n{}", prompt.system, JSON_ONLY_INSTRUCTION)
        } else {
            prompt.system
        };

        let mut request = CompletionRequest::new(RequestMetadata::new(
            prompt.session_id,
            capability,
            Uuid::new_v4().to_string(),
        ))
        .with_system_prompt(system)
        .with_message(MessageRole::User, prompt.user);

        if let Some(t) = prompt.temperature {
            request = request.with_temperature(t);
        }
        if let Some(max) = prompt.max_tokens {
            request = request.with_max_tokens(max);
        }
        request
    }

    async fn complete_text(&self, capability: &str, prompt: ModelPrompt, structured: bool) -> Result<String, AIError> {
        let request = self.to_request(capability, prompt, structured);
        let response = self.provider.complete(request).await?;
        debug!(
            capability,
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "language model call"
        );
        Ok(response.content)
    }

    async fn complete_json<T: DeserializeOwned>(&self, capability: &str, prompt: ModelPrompt) -> Result<T, AIError> {
        let text = self.complete_text(capability, prompt, true).await?;
        parse_json_reply(&text)
    }
}

#[async_trait]
impl<P: AIProvider> LanguageModelService for ProviderLanguageModel<P> {
    async fn classify(&self, prompt: ModelPrompt) -> Result<Classification, AIError> {
        self.complete_json("classify", prompt).await
    }

    async fn extract(&self, prompt: ModelPrompt) -> Result<RawExtraction, AIError> {
        self.complete_json("extract", prompt).await
    }

    async fn generate(&self, prompt: ModelPrompt) -> Result<String, AIError> {
        self.complete_text("generate", prompt, false).await
    }

    async fn validate(&self, prompt: ModelPrompt) -> Result<PlausibilityReport, AIError> {
        self.complete_json("validate", prompt).await
    }
}

/// Deserializes the first JSON object found in a model reply.
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T, AIError> {
    let json = extract_json_object(text)
        .ok_or_else(|| AIError::parse(format!("no JSON object in reply: {}", preview(text))))?;
    serde_json::from_str(json).map_err(|e| AIError::parse(format!("malformed JSON reply: {}", e)))
}

/// Finds the first balanced `{...}` in `text`, preferring a fenced code block.
fn extract_json_object(text: &str) -> Option<&str> {
    if let Some(fenced) = fenced_block(text) {
        if let Some(obj) = balanced_object(fenced) {
            return Some(obj);
        }
    }
    balanced_object(text)
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // Skip an info string such as `json`.
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(80).collect();
    if text.chars().count() > 80 {
        out.push_str("...");
    }
    out
}
