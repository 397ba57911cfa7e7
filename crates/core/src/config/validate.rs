use super::{types::Config, ConfigError};
use crate::reconciler::{MAX_INTERVAL_HOURS, MAX_INTERVAL_MINS};

/// Validate configuration
/// Currently validates:
/// - Registrar section exists (enforced by serde) and has both URLs
/// - Server port is not 0
/// - Reconcile cycle interval is not 0
/// - Escalation thresholds are not 0
/// - Check interval and escalation thresholds are at most one year
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Registrar validation
    if config.registrar.submission_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "registrar.submission_url cannot be empty".to_string(),
        ));
    }
    if config.registrar.reports_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "registrar.reports_url cannot be empty".to_string(),
        ));
    }

    // Reconciler validation
    if config.reconciler.cycle_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "reconciler.cycle_interval_ms cannot be 0".to_string(),
        ));
    }
    if config.reconciler.retry_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "reconciler.retry_attempts must be at least 1".to_string(),
        ));
    }
    if config.reconciler.check_interval_mins > MAX_INTERVAL_MINS {
        return Err(ConfigError::ValidationError(format!(
            "reconciler.check_interval_mins cannot exceed {}",
            MAX_INTERVAL_MINS
        )));
    }

    // Escalation validation
    let escalation = &config.escalation;
    if escalation.stuck_threshold_mins == 0
        || escalation.waiting_threshold_hours == 0
        || escalation.notify_threshold_hours == 0
    {
        return Err(ConfigError::ValidationError(
            "escalation thresholds must be positive".to_string(),
        ));
    }
    if escalation.stuck_threshold_mins > MAX_INTERVAL_MINS
        || escalation.waiting_threshold_hours > MAX_INTERVAL_HOURS
        || escalation.notify_threshold_hours > MAX_INTERVAL_HOURS
    {
        return Err(ConfigError::ValidationError(
            "escalation thresholds cannot exceed one year".to_string(),
        ));
    }

    if let Some(slack) = &config.notifications.slack {
        if slack.hook_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "notifications.slack.hook_url cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[registrar]
submission_url = "https://submit.example.org"
reports_url = "https://reports.example.org"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_registrar_url_fails() {
        let mut config = valid_config();
        config.registrar.reports_url = "  ".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(msg)) if msg.contains("reports_url")
        ));
    }

    #[test]
    fn test_validate_zero_interval_fails() {
        let mut config = valid_config();
        config.reconciler.cycle_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_retry_attempts_fails() {
        let mut config = valid_config();
        config.reconciler.retry_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_threshold_fails() {
        let mut config = valid_config();
        config.escalation.notify_threshold_hours = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_oversized_intervals_fail() {
        let mut config = valid_config();
        config.reconciler.check_interval_mins = u64::MAX;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(msg)) if msg.contains("check_interval_mins")
        ));

        let mut config = valid_config();
        config.escalation.stuck_threshold_mins = MAX_INTERVAL_MINS + 1;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.escalation.waiting_threshold_hours = MAX_INTERVAL_HOURS;
        assert!(validate_config(&config).is_ok());
        config.escalation.waiting_threshold_hours = MAX_INTERVAL_HOURS + 1;
        assert!(validate_config(&config).is_err());
    }
}
