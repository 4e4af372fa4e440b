//! fill-guide - fill a document template through a guided conversation.
//!
//! Usage: `fill-guide <template-file>`
//!
//! Questions are written to stdout, answers are read line by line from
//! stdin. When every placeholder has a value the collected responses are
//! printed as JSON. Logs go to stderr.

use std::error::Error;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fill_guide::adapters::{
    AnthropicConfig, AnthropicProvider, BracketPlaceholderDetector, InMemorySessionStore,
    OpenAIConfig, OpenAIProvider, ProviderLanguageModel,
};
use fill_guide::application::{
    GetSessionHandler, GetSessionQuery, ProcessTurnCommand, ProcessTurnHandler, SessionLocks,
    StartSessionCommand, StartSessionHandler,
};
use fill_guide::config::{AiConfig, AiProvider, AppConfig, LoggingConfig};
use fill_guide::domain::dialog::DialogEngine;
use fill_guide::ports::{AIProvider, LanguageModelService, SessionStore};

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fill_guide={}", config.level.to_ascii_lowercase())));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn language_model_over<P: AIProvider + 'static>(provider: P) -> Arc<dyn LanguageModelService> {
    let info = provider.provider_info();
    info!(provider = %info.name, model = %info.model, "language model configured");
    Arc::new(ProviderLanguageModel::new(provider))
}

fn build_language_model(config: &AiConfig) -> Result<Arc<dyn LanguageModelService>, Box<dyn Error>> {
    let api_key = config
        .primary_api_key()
        .ok_or("no API key configured for the selected provider")?;

    let model: Arc<dyn LanguageModelService> = match config.primary_provider {
        AiProvider::OpenAI => {
            let mut provider_config = OpenAIConfig::new(api_key)
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries);
            if let Some(model) = &config.model {
                provider_config = provider_config.with_model(model);
            }
            if let Some(url) = &config.base_url {
                provider_config = provider_config.with_base_url(url);
            }
            language_model_over(OpenAIProvider::new(provider_config)?)
        }
        AiProvider::Anthropic => {
            let mut provider_config = AnthropicConfig::new(api_key)
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries);
            if let Some(model) = &config.model {
                provider_config = provider_config.with_model(model);
            }
            if let Some(url) = &config.base_url {
                provider_config = provider_config.with_base_url(url);
            }
            language_model_over(AnthropicProvider::new(provider_config)?)
        }
    };
    Ok(model)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let template_path = std::env::args()
        .nth(1)
        .ok_or("usage: fill-guide <template-file>")?;

    let config = AppConfig::load()?;
    init_logging(&config.logging);
    config.validate()?;

    let template_text = tokio::fs::read_to_string(&template_path).await?;

    let language_model = build_language_model(&config.ai)?;
    let engine = Arc::new(DialogEngine::new(language_model, config.dialog.clone()));
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    let start = StartSessionHandler::new(
        Arc::new(BracketPlaceholderDetector::new()),
        store.clone(),
        engine.clone(),
    );
    let turns = ProcessTurnHandler::new(store.clone(), engine, SessionLocks::new());
    let progress = GetSessionHandler::new(store);

    let started = start.handle(StartSessionCommand { template_text }).await?;
    info!(
        session_id = %started.session_id,
        placeholders = started.placeholders.len(),
        "conversation started"
    );
    println!("{}", started.message);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match turns.handle(ProcessTurnCommand::new(started.session_id, line)).await {
            Ok(response) => response,
            Err(e) => {
                error!(session_id = %started.session_id, error = %e, "turn failed");
                return Err(e.into());
            }
        };
        println!("{}", response.message);

        if response.is_complete {
            break;
        }
    }

    let snapshot = progress
        .handle(GetSessionQuery {
            session_id: started.session_id,
        })
        .await?;
    if snapshot.is_complete {
        println!("{}", serde_json::to_string_pretty(&snapshot.responses)?);
    } else {
        info!(
            filled = snapshot.filled,
            total = snapshot.total,
            "input closed before every placeholder was filled"
        );
    }

    Ok(())
}
