//! Slack incoming-webhook notifier.

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Notifier, NotifyError, SuppressionWindow};

/// Slack webhook configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Incoming webhook URL.
    pub hook_url: String,
    /// Request timeout in seconds (default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

#[derive(Serialize)]
struct SlackMessage<'a> {
    text: &'a str,
}

/// Posts alerts to a Slack channel through an incoming webhook.
pub struct SlackNotifier {
    client: Client,
    hook_url: String,
    window: SuppressionWindow,
}

impl SlackNotifier {
    pub fn new(config: SlackConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            hook_url: config.hook_url,
            window: SuppressionWindow::new(),
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(
        &self,
        message: &str,
        at: DateTime<Utc>,
        suppress_within: Duration,
    ) -> Result<bool, NotifyError> {
        let previous = self.window.last_sent();
        if !self.window.try_acquire(at, suppress_within) {
            debug!("Slack notification suppressed (last sent {:?})", previous);
            return Ok(false);
        }

        let result = async {
            let response = self
                .client
                .post(&self.hook_url)
                .json(&SlackMessage { text: message })
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(NotifyError::Rejected {
                    status: status.as_u16(),
                    message: body,
                });
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                info!("Sent Slack notification");
                Ok(true)
            }
            Err(e) => {
                // Undelivered messages must not start a suppression window.
                self.window.reset_to(previous);
                Err(e)
            }
        }
    }
}
