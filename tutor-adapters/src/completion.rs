//! Text completion contract consumed by the dialogue core.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::traits::{AdapterError, AdapterResult, InferenceRequest, ModelAdapter, PromptMessage};

/// Sampling parameters sent with every completion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletionParams {
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            max_tokens: 150,
            temperature: 0.7,
        }
    }
}

/// Turns an ordered message list into generated text.
///
/// Implementations must be safe to share between sessions; each call is
/// independent of the previous one.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Requests a completion for `messages`.
    ///
    /// Returned text is trimmed and never empty.
    async fn complete(
        &self,
        messages: &[PromptMessage],
        params: CompletionParams,
    ) -> AdapterResult<String>;
}

/// Timeout and retry bounds applied around each completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    attempt_timeout: Duration,
    max_retries: u32,
    backoff: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy bounding each attempt by `attempt_timeout`.
    #[must_use]
    pub const fn new(attempt_timeout: Duration) -> Self {
        Self {
            attempt_timeout,
            max_retries: 1,
            backoff: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }

    /// Sets how many times a transient failure is retried.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the pause before a retry when the provider gives no hint.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the longest pause accepted before a retry.
    ///
    /// A provider `Retry-After` hint above this bound ends the call with the
    /// original error instead of waiting.
    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

/// [`CompletionService`] backed by a streaming [`ModelAdapter`].
#[derive(Clone)]
pub struct AdapterCompletion {
    adapter: Arc<dyn ModelAdapter>,
    policy: RetryPolicy,
}

impl fmt::Debug for AdapterCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.adapter.metadata();
        f.debug_struct("AdapterCompletion")
            .field("provider", &metadata.provider())
            .field("model", &metadata.model())
            .field("policy", &self.policy)
            .finish()
    }
}

impl AdapterCompletion {
    /// Wraps `adapter` with the default retry policy.
    #[must_use]
    pub fn new(adapter: Arc<dyn ModelAdapter>) -> Self {
        Self {
            adapter,
            policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn attempt(&self, request: InferenceRequest) -> AdapterResult<String> {
        let bound = self.policy.attempt_timeout;
        timeout(bound, self.collect(request))
            .await
            .map_err(|_| AdapterError::Timeout { elapsed: bound })?
    }

    async fn collect(&self, request: InferenceRequest) -> AdapterResult<String> {
        let mut stream = self.adapter.infer(request).await?;

        let mut response = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            response.push_str(&chunk.delta);
            if chunk.done {
                break;
            }
        }

        let trimmed = response.trim();
        if trimmed.is_empty() {
            return Err(AdapterError::EmptyResponse);
        }
        Ok(trimmed.to_owned())
    }
}

#[async_trait]
impl CompletionService for AdapterCompletion {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        params: CompletionParams,
    ) -> AdapterResult<String> {
        let request = InferenceRequest::new(messages.to_vec())?
            .with_max_output_tokens(params.max_tokens)
            .with_temperature(params.temperature);

        let metadata = self.adapter.metadata();
        let mut retries_left = self.policy.max_retries;
        loop {
            match self.attempt(request.clone()).await {
                Ok(text) => {
                    debug!(
                        provider = metadata.provider(),
                        model = metadata.model(),
                        chars = text.len(),
                        "completion received"
                    );
                    return Ok(text);
                }
                Err(err) if err.is_transient() && retries_left > 0 => {
                    let delay = err.retry_after().unwrap_or(self.policy.backoff);
                    if delay > self.policy.max_delay {
                        warn!(
                            provider = metadata.provider(),
                            model = metadata.model(),
                            error = %err,
                            ?delay,
                            max_delay = ?self.policy.max_delay,
                            "retry hint exceeds limit, giving up"
                        );
                        return Err(err);
                    }
                    retries_left -= 1;
                    warn!(
                        provider = metadata.provider(),
                        model = metadata.model(),
                        error = %err,
                        ?delay,
                        "transient completion failure, retrying"
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
