//! Operator notifications.
//!
//! Sinks decide themselves whether to deliver: every sink suppresses repeats
//! inside the window the caller passes, so callers can notify on every scan.

mod slack;

pub use slack::{SlackConfig, SlackNotifier};

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::warn;

/// Errors delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The webhook rejected the message.
    #[error("webhook returned {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Destination for operator alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` unless another message went out less than
    /// `suppress_within` before `at`. Returns whether it was delivered.
    async fn notify(
        &self,
        message: &str,
        at: DateTime<Utc>,
        suppress_within: Duration,
    ) -> Result<bool, NotifyError>;
}

/// Tracks when the last notification went out.
#[derive(Debug, Default)]
pub struct SuppressionWindow {
    last_sent: Mutex<Option<DateTime<Utc>>>,
}

impl SuppressionWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true (and records `at`) if a notification may go out now.
    pub fn try_acquire(&self, at: DateTime<Utc>, suppress_within: Duration) -> bool {
        let mut last = self
            .last_sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match *last {
            Some(sent) if at - sent < suppress_within => false,
            _ => {
                *last = Some(at);
                true
            }
        }
    }

    /// Forget the last send, e.g. after delivery failed.
    pub fn reset_to(&self, previous: Option<DateTime<Utc>>) {
        *self
            .last_sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = previous;
    }

    pub fn last_sent(&self) -> Option<DateTime<Utc>> {
        *self
            .last_sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Notifier that only writes to the log. Used when no webhook is configured.
#[derive(Debug, Default)]
pub struct LogNotifier {
    window: SuppressionWindow,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        message: &str,
        at: DateTime<Utc>,
        suppress_within: Duration,
    ) -> Result<bool, NotifyError> {
        if !self.window.try_acquire(at, suppress_within) {
            return Ok(false);
        }
        warn!("ALERT: {}", message);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_suppresses_repeats() {
        let window = SuppressionWindow::new();
        let start = Utc::now();

        assert!(window.try_acquire(start, Duration::hours(12)));
        assert!(!window.try_acquire(start + Duration::hours(1), Duration::hours(12)));
        assert!(window.try_acquire(start + Duration::hours(13), Duration::hours(12)));
        assert_eq!(window.last_sent(), Some(start + Duration::hours(13)));
    }

    #[test]
    fn test_window_reset() {
        let window = SuppressionWindow::new();
        let start = Utc::now();
        assert!(window.try_acquire(start, Duration::hours(12)));
        window.reset_to(None);
        assert!(window.try_acquire(start, Duration::hours(12)));
    }

    #[tokio::test]
    async fn test_log_notifier_suppresses() {
        let notifier = LogNotifier::new();
        let now = Utc::now();
        assert!(notifier.notify("first", now, Duration::hours(12)).await.unwrap());
        assert!(!notifier
            .notify("second", now + Duration::minutes(5), Duration::hours(12))
            .await
            .unwrap());
    }
}
