use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::manifest::{ManifestConfig, OrganismMap};
use crate::notify::SlackConfig;
use crate::reconciler::{EscalationConfig, ReconcilerConfig};
use crate::registrar::RegistrarConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub registrar: RegistrarConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub escalation: EscalationConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub manifest: ManifestConfig,
    /// Per-organism settings, keyed by organism name.
    #[serde(default)]
    pub organisms: OrganismMap,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("enasub.db")
}

/// Notification configuration. Without a Slack hook, alerts only go to the log.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub slack: Option<SlackConfig>,
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub registrar: SanitizedRegistrarConfig,
    pub reconciler: ReconcilerConfig,
    pub escalation: EscalationConfig,
    pub slack_configured: bool,
    pub manifest: ManifestConfig,
    pub organisms: Vec<String>,
}

/// Sanitized registrar config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRegistrarConfig {
    pub submission_url: String,
    pub reports_url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            registrar: SanitizedRegistrarConfig {
                submission_url: config.registrar.submission_url.clone(),
                reports_url: config.registrar.reports_url.clone(),
                username: config.registrar.username.clone(),
                password_configured: !config.registrar.password.is_empty(),
                timeout_secs: config.registrar.timeout_secs,
            },
            reconciler: config.reconciler.clone(),
            escalation: config.escalation.clone(),
            slack_configured: config.notifications.slack.is_some(),
            manifest: config.manifest.clone(),
            organisms: config.organisms.keys().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRAR: &str = r#"
[registrar]
submission_url = "https://submit.example.org"
reports_url = "https://reports.example.org"
username = "Webin-1"
password = "secret"
"#;

    #[test]
    fn test_deserialize_with_defaults() {
        let config: Config = toml::from_str(REGISTRAR).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path, PathBuf::from("enasub.db"));
        assert_eq!(config.reconciler.cycle_interval_ms, 2000);
        assert_eq!(config.escalation.stuck_threshold_mins, 15);
        assert!(config.notifications.slack.is_none());
        assert_eq!(config.manifest.db_name, "Loculus");
        assert!(config.organisms.is_empty());
    }

    #[test]
    fn test_deserialize_missing_registrar_fails() {
        let result: Result<Config, _> = toml::from_str("[server]\nport = 8080\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_full() {
        let toml = format!(
            r#"{}
[database]
path = "/var/lib/enasub/records.db"

[reconciler]
cycle_interval_ms = 500
check_interval_mins = 1

[escalation]
label = "staging"

[notifications.slack]
hook_url = "https://hooks.slack.com/services/T/B/X"

[manifest]
test_mode = true

[organisms.cchf]
molecule_type = "genomic RNA"
"#,
            REGISTRAR
        );
        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(
            config.database.path,
            PathBuf::from("/var/lib/enasub/records.db")
        );
        assert_eq!(config.reconciler.cycle_interval_ms, 500);
        assert_eq!(config.reconciler.check_interval_mins, 1);
        assert_eq!(config.escalation.label, "staging");
        assert!(config.notifications.slack.is_some());
        assert!(config.manifest.test_mode);
        assert!(config.organisms.contains_key("cchf"));
    }

    #[test]
    fn test_sanitized_config() {
        let config: Config = toml::from_str(REGISTRAR).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.registrar.password_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("Webin-1"));
    }
}
