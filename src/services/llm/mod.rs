use async_trait::async_trait;
use log::info;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{Backend, Config};
use crate::core::error::{ProviderError, StoryError};
use crate::services::retry::{RetryStrategy, Submitter};

pub mod gemini;
pub mod openai;

/// Text returned by one successful completion call, normalized across backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

pub type CompletionResult = Result<Completion, ProviderError>;

#[async_trait]
pub trait CompletionClient: Send + Sync + Debug {
    async fn complete(&self, model: &str, prompt: &str) -> CompletionResult;
}

/// Builds the client for the configured backend together with its retry strategy.
pub fn create_submitter(config: &Config) -> Result<Submitter, StoryError> {
    let llm = &config.llm;
    let timeout = Duration::from_secs(llm.timeout_seconds);
    info!("Initializing completion client for provider: {:?}", llm.provider);

    match llm.provider {
        Backend::Gemini => {
            let cfg = llm.gemini.clone().unwrap_or_default();
            let api_key = cfg.resolve_api_key()?;
            let client: Arc<dyn CompletionClient> =
                Arc::new(gemini::GeminiClient::new(&api_key, timeout));
            Ok(Submitter::new(
                client,
                RetryStrategy::fallback(&cfg.model, &cfg.fallback_models),
            ))
        }
        Backend::Groq => {
            let cfg = llm.groq.clone().unwrap_or_default();
            let api_key = cfg.resolve_api_key()?;
            let client: Arc<dyn CompletionClient> = Arc::new(openai::ChatCompletionsClient::new(
                &api_key,
                &cfg.base_url,
                timeout,
            ));
            Ok(Submitter::new(
                client,
                RetryStrategy::delayed(&cfg.model, Duration::from_secs(llm.retry_delay_seconds)),
            ))
        }
    }
}
