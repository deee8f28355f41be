//! Retry engine with exponential backoff.
//!
//! Wraps every outbound call. Rate-limit signals and transient failures are
//! absorbed here and never reach the orchestrator unless a bounded budget is
//! exhausted; anything else propagates immediately. Each retry re-acquires
//! the rate governor first: a retry is itself a fresh call against the
//! remote budget.

use super::{ApiCategory, RateGovernor};
use crate::errors::{ExportError, ExportResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry behavior configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempt budget per error class; 0 means unbounded.
    /// Unbounded is the default: a long export must never abandon a
    /// conversation solely because of throttling.
    pub max_attempts: u32,
    /// Base delay for exponential backoff
    pub base_backoff: Duration,
    /// Backoff ceiling
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(300),
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attempt budget (0 = unbounded)
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base backoff delay
    pub fn base_backoff(mut self, delay: Duration) -> Self {
        self.base_backoff = delay;
        self
    }

    /// Set the backoff ceiling
    pub fn max_backoff(mut self, delay: Duration) -> Self {
        self.max_backoff = delay;
        self
    }

    /// Backoff delay for a given failed-attempt count (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let delay = self
            .base_backoff
            .saturating_mul(2u32.saturating_pow(exp));
        delay.min(self.max_backoff)
    }
}

/// Combined governor + retry wrapper applied to every outbound call
pub struct Resilience {
    governor: Arc<RateGovernor>,
    retry: RetryConfig,
}

impl Resilience {
    /// Create a new resilience wrapper
    pub fn new(governor: Arc<RateGovernor>, retry: RetryConfig) -> Self {
        Self { governor, retry }
    }

    /// The underlying governor
    pub fn governor(&self) -> &Arc<RateGovernor> {
        &self.governor
    }

    /// Page cap for a category, from the governor's profile
    pub fn page_limit(&self, category: ApiCategory) -> u32 {
        self.governor.page_limit(category)
    }

    /// Execute an operation under governance and retry.
    ///
    /// Rate-limit failures sleep `max(server_wait, base * 2^(n-1))` — when
    /// the server's word and our schedule disagree, the larger wins.
    /// Transient network/server failures use the same schedule with a
    /// separate attempt counter. Non-retryable errors propagate untouched.
    pub async fn execute<F, Fut, T>(
        &self,
        category: ApiCategory,
        operation: F,
    ) -> ExportResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ExportResult<T>>,
    {
        let mut rate_limit_attempts: u32 = 0;
        let mut transient_attempts: u32 = 0;

        loop {
            self.governor.acquire(category).await;

            match operation().await {
                Ok(value) => {
                    let total = rate_limit_attempts + transient_attempts;
                    if total > 0 {
                        debug!(category = %category, retries = total, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) if error.is_retryable() => {
                    let attempts = if error.is_rate_limit() {
                        rate_limit_attempts += 1;
                        rate_limit_attempts
                    } else {
                        transient_attempts += 1;
                        transient_attempts
                    };

                    if self.retry.max_attempts > 0 && attempts >= self.retry.max_attempts {
                        warn!(
                            category = %category,
                            attempts,
                            error = %error,
                            "Retry budget exhausted"
                        );
                        return Err(ExportError::RetryExhausted {
                            attempts,
                            source: Box::new(error),
                        });
                    }

                    let backoff = self.retry.backoff_for(attempts);
                    let delay = match error.retry_after() {
                        Some(server_wait) => server_wait.max(backoff),
                        None => backoff,
                    };

                    warn!(
                        category = %category,
                        attempt = attempts,
                        delay_secs = delay.as_secs(),
                        error = %error,
                        "Retrying after failure"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl std::fmt::Debug for Resilience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resilience")
            .field("retry", &self.retry)
            .field("governor", &self.governor)
            .finish()
    }
}
