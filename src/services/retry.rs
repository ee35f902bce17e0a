use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::core::error::{ProviderError, SubmitError};
use crate::services::llm::CompletionClient;

#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Walk an ordered list of models, moving on after each transient failure.
    Fallback { models: Vec<String> },
    /// Stay on one model, sleeping `delay` between attempts.
    DelayedRetry {
        model: String,
        attempts: usize,
        delay: Duration,
    },
}

impl RetryStrategy {
    /// Primary first, then the fallbacks in order, without duplicates.
    pub fn fallback(primary: &str, fallbacks: &[String]) -> Self {
        let mut models: Vec<String> = Vec::with_capacity(fallbacks.len() + 1);
        for model in std::iter::once(primary).chain(fallbacks.iter().map(String::as_str)) {
            if !models.iter().any(|m| m == model) {
                models.push(model.to_string());
            }
        }
        RetryStrategy::Fallback { models }
    }

    /// A single retry after `delay`.
    pub fn delayed(model: &str, delay: Duration) -> Self {
        RetryStrategy::DelayedRetry {
            model: model.to_string(),
            attempts: 2,
            delay,
        }
    }
}

/// A completion client wrapped in its retry policy.
#[derive(Debug, Clone)]
pub struct Submitter {
    client: Arc<dyn CompletionClient>,
    strategy: RetryStrategy,
}

impl Submitter {
    pub fn new(client: Arc<dyn CompletionClient>, strategy: RetryStrategy) -> Self {
        Self { client, strategy }
    }

    pub fn strategy(&self) -> &RetryStrategy {
        &self.strategy
    }

    pub async fn submit(&self, prompt: &str) -> Result<String, SubmitError> {
        match &self.strategy {
            RetryStrategy::Fallback { models } => self.submit_with_fallback(models, prompt).await,
            RetryStrategy::DelayedRetry {
                model,
                attempts,
                delay,
            } => self.submit_with_delay(model, *attempts, *delay, prompt).await,
        }
    }

    async fn submit_with_fallback(
        &self,
        models: &[String],
        prompt: &str,
    ) -> Result<String, SubmitError> {
        let mut last_error = None;

        for model in models {
            debug!("Submitting {} chars to {}", prompt.len(), model);
            match self.client.complete(model, prompt).await {
                Ok(completion) => return Ok(completion.text),
                Err(e) if e.is_transient() => {
                    warn!("Model {} failed, trying fallback: {}", model, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(SubmitError::Fatal(e)),
            }
        }

        Err(exhausted(models.len(), last_error))
    }

    async fn submit_with_delay(
        &self,
        model: &str,
        attempts: usize,
        delay: Duration,
        prompt: &str,
    ) -> Result<String, SubmitError> {
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                warn!(
                    "Model {} unavailable (attempt {}/{}), retrying in {}s...",
                    model,
                    attempt + 1,
                    attempts,
                    delay.as_secs()
                );
                sleep(delay).await;
            }

            match self.client.complete(model, prompt).await {
                Ok(completion) => return Ok(completion.text),
                Err(e) if e.is_transient() => last_error = Some(e),
                Err(e) => return Err(SubmitError::Fatal(e)),
            }
        }

        Err(exhausted(attempts, last_error))
    }
}

fn exhausted(attempts: usize, last: Option<ProviderError>) -> SubmitError {
    match last {
        Some(last) => SubmitError::Exhausted { attempts, last },
        None => SubmitError::Fatal(ProviderError::from_message("no model candidates configured")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::services::llm::{Completion, CompletionResult};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned results in order and records the models it was asked for.
    #[derive(Debug)]
    struct ScriptedClient {
        responses: Mutex<VecDeque<CompletionResult>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<CompletionResult>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn models_called(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, model: &str, _prompt: &str) -> CompletionResult {
            self.calls.lock().unwrap().push(model.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::from_message("script exhausted")))
        }
    }

    fn ok(text: &str) -> CompletionResult {
        Ok(Completion::new(text))
    }

    fn rate_limited() -> CompletionResult {
        Err(ProviderError::new(Some(429), "429 RESOURCE_EXHAUSTED"))
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fallback_candidates_deduplicated() {
        let strategy = RetryStrategy::fallback("a", &models(&["b", "a", "c", "b"]));
        assert_eq!(
            strategy,
            RetryStrategy::Fallback {
                models: models(&["a", "b", "c"])
            }
        );
    }

    #[tokio::test]
    async fn test_fallback_recovers_after_transient_failures() {
        let client = Arc::new(ScriptedClient::new(vec![
            rate_limited(),
            Err(ProviderError::from_message("model is UNAVAILABLE")),
            ok("third time lucky"),
        ]));
        let submitter = Submitter::new(
            client.clone(),
            RetryStrategy::Fallback {
                models: models(&["m1", "m2", "m3"]),
            },
        );

        let text = submitter.submit("prompt").await.unwrap();

        assert_eq!(text, "third time lucky");
        assert_eq!(client.models_called(), models(&["m1", "m2", "m3"]));
    }

    #[tokio::test]
    async fn test_fallback_stops_at_first_success() {
        let client = Arc::new(ScriptedClient::new(vec![rate_limited(), ok("done")]));
        let submitter = Submitter::new(
            client.clone(),
            RetryStrategy::Fallback {
                models: models(&["m1", "m2", "m3"]),
            },
        );

        assert_eq!(submitter.submit("prompt").await.unwrap(), "done");
        assert_eq!(client.models_called().len(), 2);
    }

    #[tokio::test]
    async fn test_fatal_error_skips_fallbacks() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err(ProviderError::new(Some(401), "API key not valid")),
            ok("never reached"),
        ]));
        let submitter = Submitter::new(
            client.clone(),
            RetryStrategy::Fallback {
                models: models(&["m1", "m2"]),
            },
        );

        let err = submitter.submit("prompt").await.unwrap_err();

        match err {
            SubmitError::Fatal(e) => {
                assert_eq!(e.message, "API key not valid");
                assert_eq!(e.status, Some(401));
                assert_eq!(e.kind, ErrorKind::Fatal);
            }
            other => panic!("expected fatal error, got {:?}", other),
        }
        assert_eq!(client.models_called(), models(&["m1"]));
    }

    #[tokio::test]
    async fn test_all_candidates_exhausted() {
        let client = Arc::new(ScriptedClient::new(vec![
            rate_limited(),
            Err(ProviderError::new(Some(503), "overloaded")),
        ]));
        let submitter = Submitter::new(
            client.clone(),
            RetryStrategy::Fallback {
                models: models(&["m1", "m2"]),
            },
        );

        let err = submitter.submit("prompt").await.unwrap_err();

        match err {
            SubmitError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert_eq!(last.message, "overloaded");
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delayed_retry_succeeds_on_second_attempt() {
        let client = Arc::new(ScriptedClient::new(vec![rate_limited(), ok("patience")]));
        let submitter = Submitter::new(client.clone(), RetryStrategy::delayed("llama", Duration::ZERO));

        assert_eq!(submitter.submit("prompt").await.unwrap(), "patience");
        assert_eq!(client.models_called(), models(&["llama", "llama"]));
    }

    #[tokio::test]
    async fn test_delayed_retry_gives_up_after_one_retry() {
        let client = Arc::new(ScriptedClient::new(vec![
            rate_limited(),
            rate_limited(),
            ok("too late"),
        ]));
        let submitter = Submitter::new(client.clone(), RetryStrategy::delayed("llama", Duration::ZERO));

        let err = submitter.submit("prompt").await.unwrap_err();

        assert!(matches!(err, SubmitError::Exhausted { attempts: 2, .. }));
        assert_eq!(client.models_called().len(), 2);
    }

    #[tokio::test]
    async fn test_delayed_retry_does_not_retry_fatal() {
        let client = Arc::new(ScriptedClient::new(vec![Err(ProviderError::new(
            Some(400),
            "bad request",
        ))]));
        let submitter = Submitter::new(client.clone(), RetryStrategy::delayed("llama", Duration::ZERO));

        assert!(matches!(
            submitter.submit("prompt").await,
            Err(SubmitError::Fatal(_))
        ));
        assert_eq!(client.models_called().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_candidate_list() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let submitter = Submitter::new(client, RetryStrategy::Fallback { models: vec![] });
        assert!(matches!(
            submitter.submit("prompt").await,
            Err(SubmitError::Fatal(_))
        ));
    }
}
