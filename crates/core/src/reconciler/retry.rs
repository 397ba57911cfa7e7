//! Bounded retry for store writes.

use std::time::Duration;

use tracing::warn;

use crate::metrics::{STORE_WRITE_EXHAUSTED, STORE_WRITE_RETRIES};
use crate::record::{SequenceKey, StoreError};

/// Retry policy for the store write that records a registrar outcome.
///
/// Only the local write is retried. The registrar call that produced the
/// outcome is **not idempotent** and must never be repeated: a second
/// `create` registers a second assembly upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// A successful call is never repeated, even if it changed zero rows.
    pub async fn run<T>(
        &self,
        key: &SequenceKey,
        mut op: impl FnMut() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts => {
                    warn!(
                        "Store write for {} failed (attempt {}/{}): {}",
                        key, attempt, self.max_attempts, e
                    );
                    STORE_WRITE_RETRIES.inc();
                    attempt += 1;
                    if !self.backoff.is_zero() {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
                Err(e) => {
                    STORE_WRITE_EXHAUSTED.inc();
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::ZERO)
    }
}
