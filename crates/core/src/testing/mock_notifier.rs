//! Mock notifier for testing.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::notify::{Notifier, NotifyError};

/// A recorded notification for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedNotification {
    pub message: String,
    pub at: DateTime<Utc>,
    pub suppress_within: Duration,
}

/// Mock implementation of the Notifier trait.
///
/// Records every call and reports it as delivered; it never suppresses, so
/// tests see every attempt the caller makes.
#[derive(Debug, Default)]
pub struct MockNotifier {
    notifications: Arc<RwLock<Vec<RecordedNotification>>>,
    /// If set, the next call fails with this status.
    next_error: Arc<RwLock<Option<u16>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded notifications.
    pub async fn notifications(&self) -> Vec<RecordedNotification> {
        self.notifications.read().await.clone()
    }

    /// Make the next call fail as if the webhook answered `status`.
    pub async fn set_next_error(&self, status: u16) {
        *self.next_error.write().await = Some(status);
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(
        &self,
        message: &str,
        at: DateTime<Utc>,
        suppress_within: Duration,
    ) -> Result<bool, NotifyError> {
        self.notifications.write().await.push(RecordedNotification {
            message: message.to_string(),
            at,
            suppress_within,
        });

        if let Some(status) = self.next_error.write().await.take() {
            return Err(NotifyError::Rejected {
                status,
                message: "mock failure".to_string(),
            });
        }
        Ok(true)
    }
}
