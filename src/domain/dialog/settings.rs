//! Tunables for the dialog engine.

use serde::Deserialize;

/// What happens to a stored value that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidValuePolicy {
    /// The value stays in `responses`; errors are reported to the user.
    #[default]
    Keep,
    /// The value moves to the held set until the user confirms it.
    Hold,
}

/// Dialog engine settings, loaded from the `dialog` config section.
#[derive(Debug, Clone, Deserialize)]
pub struct DialogSettings {
    /// LM classifications below this confidence are routed as answers.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    #[serde(default)]
    pub invalid_value_policy: InvalidValuePolicy,

    /// Run the model-backed plausibility stage of validation.
    #[serde(default = "default_plausibility_check")]
    pub plausibility_check: bool,

    /// Acknowledgments kept in the question generator's context.
    #[serde(default = "default_question_context_limit")]
    pub question_context_limit: usize,
}

fn default_min_confidence() -> f32 {
    0.5
}

fn default_plausibility_check() -> bool {
    true
}

fn default_question_context_limit() -> usize {
    10
}

impl Default for DialogSettings {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            invalid_value_policy: InvalidValuePolicy::default(),
            plausibility_check: default_plausibility_check(),
            question_context_limit: default_question_context_limit(),
        }
    }
}

impl DialogSettings {
    pub fn with_policy(mut self, policy: InvalidValuePolicy) -> Self {
        self.invalid_value_policy = policy;
        self
    }

    pub fn without_plausibility_check(mut self) -> Self {
        self.plausibility_check = false;
        self
    }
}
