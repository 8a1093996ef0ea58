// src/provider/retry.rs — Retry with exponential backoff
//
// `with_retry` is the reusable combinator; `RetryProvider` applies it to any
// ModelProvider. Retries: rate limits (429), server errors (5xx), timeouts,
// connection failures. Does NOT retry: bad request, auth errors, config errors.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, ModelProvider};
use crate::infra::errors::ReviewEvalError;

const MAX_RETRIES: u32 = 3;
const INITIAL_DELAY_MS: u64 = 1_000;
const BACKOFF_FACTOR: f64 = 2.0;
const MAX_DELAY_MS: u64 = 30_000;
const JITTER_FRACTION: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
    pub jitter_fraction: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_delay: Duration::from_millis(INITIAL_DELAY_MS),
            backoff_factor: BACKOFF_FACTOR,
            max_delay: Duration::from_millis(MAX_DELAY_MS),
            jitter_fraction: JITTER_FRACTION,
        }
    }
}

impl RetryPolicy {
    /// A policy that never waits between attempts. Used in tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32, rate_limit_delay: Option<Duration>) -> Duration {
        // Server-provided hint wins, capped at max_delay, plus a small buffer.
        if let Some(rl_delay) = rate_limit_delay {
            return rl_delay.min(self.max_delay) + Duration::from_millis(100);
        }

        let base_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(attempt as i32);
        let capped_ms = base_ms.min(self.max_delay.as_millis() as f64);
        let jitter = deterministic_jitter(attempt, self.jitter_fraction);

        Duration::from_millis((capped_ms * jitter) as u64)
    }
}

fn rate_limit_delay(error: &ReviewEvalError) -> Option<Duration> {
    match error {
        ReviewEvalError::RateLimited { retry_after_ms, .. } if *retry_after_ms > 0 => {
            Some(Duration::from_millis(*retry_after_ms))
        }
        _ => None,
    }
}

/// Multiplier in [1 - fraction, 1 + fraction], reproducible per attempt.
fn deterministic_jitter(attempt: u32, fraction: f64) -> f64 {
    let hash = (attempt.wrapping_mul(2654435761)) as f64 / u32::MAX as f64;
    1.0 + fraction * (2.0 * hash - 1.0)
}

/// Run `op` until it succeeds, fails with a non-retriable error, or the
/// policy's retry budget is spent. The last error is returned on exhaustion.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, ReviewEvalError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ReviewEvalError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !e.is_retriable() {
                    tracing::debug!(label, "Non-retriable error: {}", e);
                    return Err(e);
                }
                if attempt >= policy.max_retries {
                    tracing::error!(
                        label,
                        retries = policy.max_retries,
                        "Giving up after retries: {}",
                        e
                    );
                    return Err(e);
                }

                let delay = policy.delay_for_attempt(attempt, rate_limit_delay(&e));
                tracing::warn!(
                    label,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after error: {}",
                    e
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// A provider wrapper that retries `chat()` on transient errors.
pub struct RetryProvider {
    inner: Arc<dyn ModelProvider>,
    policy: RetryPolicy,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn ModelProvider>) -> Self {
        Self {
            inner,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(inner: Arc<dyn ModelProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl ModelProvider for RetryProvider {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ReviewEvalError> {
        let inner = self.inner.as_ref();
        let label = format!("{}:{}", inner.id(), request.model);
        with_retry(&self.policy, &label, move || {
            let req = request.clone();
            async move { inner.chat(req).await }
        })
        .await
    }
}
