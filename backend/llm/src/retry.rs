//! Retry wrapper: exponential backoff with jitter around any backend.
//!
//! When the retry budget is exhausted the wrapper does not fail; it answers
//! with the `"No response"` sentinel, which the session runner treats as
//! backend exhaustion.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use webrun_core::{LlmBackend, LlmRequest, LlmResponse, NO_RESPONSE};

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first call included.
    pub max_attempts: u32,
    /// Base delay between retries in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplier for each subsequent wait (exponential factor).
    pub backoff_factor: f64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Add random jitter (±25% of computed delay) to avoid thundering herd.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            backoff_factor: 2.0,
            max_delay_ms: 60_000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Compute the delay after failed attempt `attempt_number` (1-indexed).
    pub fn delay_for(&self, attempt_number: u32) -> Duration {
        if attempt_number == 0 {
            return Duration::ZERO;
        }
        let delay_ms =
            self.base_delay_ms as f64 * self.backoff_factor.powi((attempt_number - 1) as i32);
        let delay_ms = delay_ms.min(self.max_delay_ms as f64) as u64;

        let delay_ms = if self.jitter {
            let jitter = (delay_ms / 4) as i64;
            let offset: i64 = if jitter > 0 {
                (rand_offset() % (jitter as u64 * 2)) as i64 - jitter
            } else {
                0
            };
            (delay_ms as i64 + offset).max(0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(delay_ms)
    }

    pub fn should_retry(&self, attempt_number: u32) -> bool {
        attempt_number < self.max_attempts
    }
}

/// Simple xorshift64 for jitter without pulling in a full rand dep.
fn rand_offset() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static SEED: AtomicU64 = AtomicU64::new(0x123456789abcdef0);
    let x = SEED.load(Ordering::Relaxed);
    let x = x ^ (x << 13);
    let x = x ^ (x >> 7);
    let x = x ^ (x << 17);
    SEED.store(x, Ordering::Relaxed);
    x
}

/// Attempt bookkeeping for one request.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    pub attempt: u32,
    pub last_error: Option<String>,
    pub exhausted: bool,
}

impl RetryState {
    /// Record a failure. Returns the wait before the next attempt, or `None`
    /// once the policy is exhausted.
    pub fn record_failure(&mut self, policy: &RetryPolicy, error: &str) -> Option<Duration> {
        self.attempt += 1;
        self.last_error = Some(error.to_string());

        if policy.should_retry(self.attempt) {
            let delay = policy.delay_for(self.attempt);
            warn!(
                attempt = self.attempt,
                max = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "LLM call failed, will retry"
            );
            Some(delay)
        } else {
            self.exhausted = true;
            warn!(attempt = self.attempt, error = %error, "LLM retry policy exhausted");
            None
        }
    }
}

/// Backend decorator applying a [`RetryPolicy`].
pub struct RetryingBackend {
    inner: Arc<dyn LlmBackend>,
    policy: RetryPolicy,
    rate_limited: Option<bool>,
}

impl RetryingBackend {
    pub fn new(inner: Arc<dyn LlmBackend>, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            rate_limited: None,
        }
    }

    /// Override the wrapped backend's rate-limit flag.
    pub fn with_rate_limit(mut self, rate_limited: Option<bool>) -> Self {
        self.rate_limited = rate_limited;
        self
    }
}

#[async_trait]
impl LlmBackend for RetryingBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn rate_limited(&self) -> bool {
        self.rate_limited.unwrap_or_else(|| self.inner.rate_limited())
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();
        let mut state = RetryState::default();
        loop {
            match self.inner.complete(request).await {
                Ok(response) => {
                    if state.attempt > 0 {
                        debug!(attempts = state.attempt + 1, "LLM call recovered after retry");
                    }
                    return Ok(response);
                }
                Err(e) => match state.record_failure(&self.policy, &e.to_string()) {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => {
                        return Ok(LlmResponse {
                            content: NO_RESPONSE.to_string(),
                            backend: self.inner.name().to_string(),
                            model: String::new(),
                            tokens_used: 0,
                            latency_ms: start.elapsed().as_millis() as u64,
                        })
                    }
                },
            }
        }
    }
}
