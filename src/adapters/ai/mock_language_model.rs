//! Mock Language Model Service for testing.
//!
//! Each capability has its own queue of scripted results. An empty queue
//! behaves like an unavailable service for the three capabilities the engine
//! has fallbacks for, and like a clean report for `validate`.
//!
//! # Example
//!
//! ```ignore
//! let lm = MockLanguageModel::new()
//!     .with_classification(Classification::new(QueryType::Answer, 0.9))
//!     .with_generation("What is the company's name?");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::mock_provider::{lock, MockError};
use crate::domain::dialog::{Classification, PlausibilityReport, RawExtraction};
use crate::ports::{AIError, LanguageModelService, ModelPrompt};

/// Which capability a recorded call went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Classify,
    Extract,
    Generate,
    Validate,
}

#[derive(Debug, Default)]
struct Script {
    classifications: VecDeque<Result<Classification, MockError>>,
    extractions: VecDeque<Result<RawExtraction, MockError>>,
    generations: VecDeque<Result<String, MockError>>,
    validations: VecDeque<Result<PlausibilityReport, MockError>>,
    calls: Vec<(Capability, ModelPrompt)>,
}

/// Scripted language model.
#[derive(Debug, Clone, Default)]
pub struct MockLanguageModel {
    script: Arc<Mutex<Script>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classification(self, classification: Classification) -> Self {
        lock(&self.script).classifications.push_back(Ok(classification));
        self
    }

    pub fn with_classification_error(self, error: MockError) -> Self {
        lock(&self.script).classifications.push_back(Err(error));
        self
    }

    pub fn with_extraction(self, extraction: RawExtraction) -> Self {
        lock(&self.script).extractions.push_back(Ok(extraction));
        self
    }

    pub fn with_extraction_error(self, error: MockError) -> Self {
        lock(&self.script).extractions.push_back(Err(error));
        self
    }

    /// Queues a free-text result; questions and explanations share this queue.
    pub fn with_generation(self, text: impl Into<String>) -> Self {
        lock(&self.script).generations.push_back(Ok(text.into()));
        self
    }

    pub fn with_generation_error(self, error: MockError) -> Self {
        lock(&self.script).generations.push_back(Err(error));
        self
    }

    pub fn with_validation(self, report: PlausibilityReport) -> Self {
        lock(&self.script).validations.push_back(Ok(report));
        self
    }

    pub fn with_validation_error(self, error: MockError) -> Self {
        lock(&self.script).validations.push_back(Err(error));
        self
    }

    /// Total calls across all capabilities.
    pub fn call_count(&self) -> usize {
        lock(&self.script).calls.len()
    }

    pub fn calls_to(&self, capability: Capability) -> usize {
        lock(&self.script)
            .calls
            .iter()
            .filter(|(c, _)| *c == capability)
            .count()
    }

    pub fn calls(&self) -> Vec<(Capability, ModelPrompt)> {
        lock(&self.script).calls.clone()
    }

    pub fn last_prompt(&self) -> Option<ModelPrompt> {
        lock(&self.script).calls.last().map(|(_, p)| p.clone())
    }

    fn record(&self, capability: Capability, prompt: ModelPrompt) {
        lock(&self.script).calls.push((capability, prompt));
    }
}

fn exhausted(capability: &str) -> AIError {
    AIError::unavailable(format!("no scripted {} result", capability))
}

#[async_trait]
impl LanguageModelService for MockLanguageModel {
    async fn classify(&self, prompt: ModelPrompt) -> Result<Classification, AIError> {
        self.record(Capability::Classify, prompt);
        match lock(&self.script).classifications.pop_front() {
            Some(result) => result.map_err(AIError::from),
            None => Err(exhausted("classify")),
        }
    }

    async fn extract(&self, prompt: ModelPrompt) -> Result<RawExtraction, AIError> {
        self.record(Capability::Extract, prompt);
        match lock(&self.script).extractions.pop_front() {
            Some(result) => result.map_err(AIError::from),
            None => Err(exhausted("extract")),
        }
    }

    async fn generate(&self, prompt: ModelPrompt) -> Result<String, AIError> {
        self.record(Capability::Generate, prompt);
        match lock(&self.script).generations.pop_front() {
            Some(result) => result.map_err(AIError::from),
            None => Err(exhausted("generate")),
        }
    }

    async fn validate(&self, prompt: ModelPrompt) -> Result<PlausibilityReport, AIError> {
        self.record(Capability::Validate, prompt);
        match lock(&self.script).validations.pop_front() {
            Some(result) => result.map_err(AIError::from),
            None => Ok(PlausibilityReport::default()),
        }
    }
}
