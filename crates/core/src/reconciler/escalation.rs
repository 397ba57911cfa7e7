//! Alerts for assembly records that stopped moving.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::config::EscalationConfig;
use super::types::{EscalationReport, ReconcileError};
use crate::metrics::NOTIFICATIONS_SENT;
use crate::notify::Notifier;
use crate::record::{EntryStatus, SubmissionStore};

pub struct EscalationMonitor {
    store: Arc<dyn SubmissionStore>,
    notifier: Arc<dyn Notifier>,
    config: EscalationConfig,
}

impl EscalationMonitor {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        notifier: Arc<dyn Notifier>,
        config: EscalationConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub async fn scan(&self) -> Result<EscalationReport, ReconcileError> {
        self.scan_at(Utc::now()).await
    }

    /// Report records stuck in `HAS_ERRORS`/`SUBMITTING` or waiting too long
    /// for accessions. Whether a message goes out is up to the notifier.
    pub async fn scan_at(&self, now: DateTime<Utc>) -> Result<EscalationReport, ReconcileError> {
        let mut report = EscalationReport::default();

        let stuck = self.store.assemblies_started_before(
            &[EntryStatus::HasErrors, EntryStatus::Submitting],
            now - self.config.stuck_threshold(),
        )?;
        report.stuck = stuck.len();
        if !stuck.is_empty() {
            let keys: Vec<String> = stuck.iter().map(|r| r.key.to_string()).collect();
            warn!(
                "{} assemblies in HAS_ERRORS or SUBMITTING for over {}m: {}",
                stuck.len(),
                self.config.stuck_threshold_mins,
                keys.join(", ")
            );
            let message = format!(
                "{}: assembly submission found {} entries in assembly_table in status \
                 HAS_ERRORS or SUBMITTING for over {}m",
                self.config.label,
                stuck.len(),
                self.config.stuck_threshold_mins
            );
            if self.send("stuck", &message, now).await {
                report.notified += 1;
            }
        }

        let waiting = self.store.assemblies_started_before(
            &[EntryStatus::Waiting],
            now - self.config.waiting_threshold(),
        )?;
        report.waiting = waiting.len();
        if !waiting.is_empty() {
            let keys: Vec<String> = waiting.iter().map(|r| r.key.to_string()).collect();
            warn!(
                "{} assemblies WAITING for over {}h: {}",
                waiting.len(),
                self.config.waiting_threshold_hours,
                keys.join(", ")
            );
            let message = format!(
                "{}: assembly submission found {} entries in assembly_table in status \
                 WAITING for over {}h",
                self.config.label,
                waiting.len(),
                self.config.waiting_threshold_hours
            );
            if self.send("waiting", &message, now).await {
                report.notified += 1;
            }
        }

        Ok(report)
    }

    async fn send(&self, kind: &str, message: &str, now: DateTime<Utc>) -> bool {
        match self
            .notifier
            .notify(message, now, self.config.notify_threshold())
            .await
        {
            Ok(true) => {
                info!("Sent {} notification", kind);
                NOTIFICATIONS_SENT.with_label_values(&[kind]).inc();
                true
            }
            Ok(false) => {
                debug!("{} notification suppressed", kind);
                false
            }
            Err(e) => {
                warn!("Failed to send {} notification: {}", kind, e);
                false
            }
        }
    }
}
