// src/checker/retry.rs
// =============================================================================
// Retry with exponential backoff, shared by the DNS, TCP and HTTP stages.
//
// With `retries = R` an operation gets R + 1 attempts. After failed attempt k
// (counting from 0) we sleep `base * 2^k + random(0..jitter)` before trying
// again. The last failure is handed back to the caller as a value, so a stage
// always ends with something it can record.
// =============================================================================

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use super::error::ProbeError;

// Caps the exponent so huge retry counts can't overflow the multiplication
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Backoff settings for one stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Retries after the first attempt
    pub retries: u32,
    /// Delay after the first failure, doubled for each later failure
    pub base: Duration,
    /// Upper bound of the random extra delay
    pub jitter: Duration,
}

impl Backoff {
    pub fn new(retries: u32, base: Duration, jitter: Duration) -> Self {
        Self {
            retries,
            base,
            jitter,
        }
    }

    /// Total number of attempts this policy allows.
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Delay before the retry that follows failed attempt `attempt` (0-indexed),
    /// without the random part.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        self.base
            .saturating_mul(1u32 << attempt.min(MAX_BACKOFF_EXPONENT))
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay(attempt) + random_up_to(self.jitter)
    }

    /// Runs `operation` until it succeeds or the attempts run out.
    ///
    /// `stage` only labels the log lines.
    pub async fn run<F, Fut, T>(&self, stage: &str, mut operation: F) -> Result<T, ProbeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProbeError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.retries => {
                    debug!(
                        stage,
                        attempts = attempt + 1,
                        timeout = e.is_timeout(),
                        error = %e,
                        "giving up"
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    debug!(
                        stage,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Uniform random duration in `[0, bound]`.
pub(crate) fn random_up_to(bound: Duration) -> Duration {
    if bound.is_zero() {
        return Duration::ZERO;
    }
    let nanos = rand::rng().random_range(0..=bound.as_nanos().min(u64::MAX as u128) as u64);
    Duration::from_nanos(nanos)
}
