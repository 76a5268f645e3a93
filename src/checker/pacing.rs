// src/checker/pacing.rs
// =============================================================================
// A shared gate that spaces out HTTP attempts across the whole batch.
//
// Sites behind bot protection get suspicious when dozens of requests arrive
// in the same instant. Every HTTP attempt goes through `acquire()` first:
// - if the previous grant was less than `delay` ago, wait out the rest of
//   `delay` plus a random `0..=jitter`
// - then record "now" as the last grant
//
// The lock is held across the wait, so callers line up one at a time and
// nobody can act on a stale timestamp.
// =============================================================================

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

use super::retry::random_up_to;

#[derive(Debug)]
pub struct PacingLimiter {
    delay: Duration,
    jitter: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl PacingLimiter {
    pub fn new(delay: Duration, jitter: Duration) -> Self {
        Self {
            delay,
            jitter,
            last_grant: Mutex::new(None),
        }
    }

    /// Waits until this caller may start an HTTP attempt.
    pub async fn acquire(&self) {
        let mut last_grant = self.last_grant.lock().await;

        if let Some(previous) = *last_grant {
            let elapsed = previous.elapsed();
            if elapsed < self.delay {
                let wait = (self.delay - elapsed).saturating_add(random_up_to(self.jitter));
                trace!(wait_ms = wait.as_millis() as u64, "pacing HTTP attempt");
                tokio::time::sleep(wait).await;
            }
        }

        *last_grant = Some(Instant::now());
    }
}
