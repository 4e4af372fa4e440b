//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `FILL_GUIDE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use fill_guide::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Using {:?}", config.ai.primary_provider);
//! ```

mod ai;
mod error;
mod logging;

pub use ai::{AiConfig, AiProvider};
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;

use serde::Deserialize;

use crate::domain::dialog::DialogSettings;

/// Root application configuration
///
/// Every section has defaults, so only the selected provider's API key is
/// required. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// AI provider configuration (OpenAI/Anthropic)
    #[serde(default)]
    pub ai: AiConfig,

    /// Dialog engine tunables
    #[serde(default)]
    pub dialog: DialogSettings,

    /// Log level and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `FILL_GUIDE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `FILL_GUIDE__AI__PRIMARY_PROVIDER=openai` -> `ai.primary_provider = openai`
    /// - `FILL_GUIDE__DIALOG__MIN_CONFIDENCE=0.6` -> `dialog.min_confidence = 0.6`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("FILL_GUIDE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the selected provider has no key or a
    /// dialog tunable is out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        validate_dialog(&self.dialog)?;
        self.logging.validate()?;
        Ok(())
    }
}

fn validate_dialog(settings: &DialogSettings) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&settings.min_confidence) {
        return Err(ValidationError::InvalidMinConfidence);
    }
    if settings.question_context_limit == 0 {
        return Err(ValidationError::InvalidContextLimit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialog::InvalidValuePolicy;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "FILL_GUIDE__AI__ANTHROPIC_API_KEY",
        "FILL_GUIDE__AI__OPENAI_API_KEY",
        "FILL_GUIDE__AI__PRIMARY_PROVIDER",
        "FILL_GUIDE__AI__MODEL",
        "FILL_GUIDE__DIALOG__MIN_CONFIDENCE",
        "FILL_GUIDE__DIALOG__INVALID_VALUE_POLICY",
        "FILL_GUIDE__LOGGING__JSON",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("FILL_GUIDE__AI__ANTHROPIC_API_KEY", "sk-ant-xxx");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert!(config.ai.has_anthropic());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_without_sections() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.ai.primary_provider, AiProvider::Anthropic);
        assert_eq!(config.dialog.min_confidence, 0.5);
        assert_eq!(config.dialog.invalid_value_policy, InvalidValuePolicy::Keep);
        assert_eq!(config.logging.level, "info");
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"))
        ));
    }

    #[test]
    fn test_nested_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("FILL_GUIDE__AI__PRIMARY_PROVIDER", "openai");
        env::set_var("FILL_GUIDE__AI__OPENAI_API_KEY", "sk-xxx");
        env::set_var("FILL_GUIDE__AI__MODEL", "gpt-4o");
        env::set_var("FILL_GUIDE__DIALOG__INVALID_VALUE_POLICY", "hold");
        env::set_var("FILL_GUIDE__LOGGING__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ai.primary_provider, AiProvider::OpenAI);
        assert_eq!(config.ai.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.dialog.invalid_value_policy, InvalidValuePolicy::Hold);
        assert!(config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_min_confidence_out_of_range() {
        let mut config = AppConfig::default();
        config.ai.anthropic_api_key = Some(secrecy::Secret::new("sk-ant-xxx".to_string()));
        config.dialog.min_confidence = 1.5;

        assert!(matches!(config.validate(), Err(ValidationError::InvalidMinConfidence)));
    }

    #[test]
    fn test_zero_context_limit() {
        let mut config = AppConfig::default();
        config.ai.anthropic_api_key = Some(secrecy::Secret::new("sk-ant-xxx".to_string()));
        config.dialog.question_context_limit = 0;

        assert!(matches!(config.validate(), Err(ValidationError::InvalidContextLimit)));
    }
}
