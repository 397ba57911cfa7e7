//! Reconciler and escalation configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::retry::RetryPolicy;

/// Upper bound for minute-valued intervals and thresholds (one year).
pub const MAX_INTERVAL_MINS: u64 = 365 * 24 * 60;

/// Upper bound for hour-valued thresholds (one year).
pub const MAX_INTERVAL_HOURS: u64 = 365 * 24;

/// Configuration for the reconcile loop and its state machines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Sleep between reconcile cycles (milliseconds).
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_ms: u64,

    /// Attempts for a store write that follows a registrar call.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Pause between those attempts (milliseconds).
    #[serde(default)]
    pub retry_backoff_ms: u64,

    /// Minimum time between two batches of registrar checks (minutes).
    #[serde(default = "default_check_interval")]
    pub check_interval_mins: u64,
}

fn default_cycle_interval() -> u64 {
    2000 // 2 seconds
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_check_interval() -> u64 {
    5
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: default_cycle_interval(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: 0,
            check_interval_mins: default_check_interval(),
        }
    }
}

impl ReconcilerConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn check_interval(&self) -> chrono::Duration {
        minutes(self.check_interval_mins)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_backoff_ms),
        )
    }
}

/// Thresholds for alerting on records that stopped moving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// `HAS_ERRORS` or `SUBMITTING` records older than this are reported (minutes).
    #[serde(default = "default_stuck_threshold")]
    pub stuck_threshold_mins: u64,

    /// `WAITING` records older than this are reported (hours).
    #[serde(default = "default_waiting_threshold")]
    pub waiting_threshold_hours: u64,

    /// Minimum time between two notifications (hours).
    #[serde(default = "default_notify_threshold")]
    pub notify_threshold_hours: u64,

    /// Instance name prefixed to every alert.
    #[serde(default = "default_label")]
    pub label: String,
}

fn default_stuck_threshold() -> u64 {
    15
}

fn default_waiting_threshold() -> u64 {
    48
}

fn default_notify_threshold() -> u64 {
    12
}

fn default_label() -> String {
    "enasub".to_string()
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            stuck_threshold_mins: default_stuck_threshold(),
            waiting_threshold_hours: default_waiting_threshold(),
            notify_threshold_hours: default_notify_threshold(),
            label: default_label(),
        }
    }
}

impl EscalationConfig {
    pub fn stuck_threshold(&self) -> chrono::Duration {
        minutes(self.stuck_threshold_mins)
    }

    pub fn waiting_threshold(&self) -> chrono::Duration {
        hours(self.waiting_threshold_hours)
    }

    pub fn notify_threshold(&self) -> chrono::Duration {
        hours(self.notify_threshold_hours)
    }
}

// Clamped to the bounds `validate_config` enforces.
fn minutes(value: u64) -> chrono::Duration {
    chrono::Duration::minutes(value.min(MAX_INTERVAL_MINS) as i64)
}

fn hours(value: u64) -> chrono::Duration {
    chrono::Duration::hours(value.min(MAX_INTERVAL_HOURS) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.cycle_interval_ms, 2000);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_backoff_ms, 0);
        assert_eq!(config.check_interval(), chrono::Duration::minutes(5));
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: ReconcilerConfig = toml::from_str("retry_attempts = 5").unwrap();
        assert_eq!(config.retry_attempts, 5);
        assert_eq!(config.cycle_interval_ms, 2000);

        assert_eq!(config.retry_policy(), RetryPolicy::new(5, Duration::ZERO));
    }

    #[test]
    fn test_escalation_defaults() {
        let config: EscalationConfig = toml::from_str(r#"label = "pathoplexus-prod""#).unwrap();
        assert_eq!(config.label, "pathoplexus-prod");
        assert_eq!(config.stuck_threshold(), chrono::Duration::minutes(15));
        assert_eq!(config.waiting_threshold(), chrono::Duration::hours(48));
        assert_eq!(config.notify_threshold(), chrono::Duration::hours(12));
    }

    #[test]
    fn test_oversized_intervals_are_clamped() {
        let config = ReconcilerConfig {
            check_interval_mins: u64::MAX,
            ..Default::default()
        };
        assert_eq!(
            config.check_interval(),
            chrono::Duration::minutes(MAX_INTERVAL_MINS as i64)
        );

        let config = EscalationConfig {
            waiting_threshold_hours: u64::MAX,
            ..Default::default()
        };
        assert_eq!(
            config.waiting_threshold(),
            chrono::Duration::hours(MAX_INTERVAL_HOURS as i64)
        );
    }
}
