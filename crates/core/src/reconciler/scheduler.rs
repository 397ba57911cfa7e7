//! Reconcile loop.
//!
//! Each cycle runs, in order: submission advance, submission confirm, flush
//! of unrecorded registrar outcomes, assembly create, assembly confirm and
//! the escalation scan. Then it sleeps for the cycle interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

use super::assembly::AssemblyMachine;
use super::escalation::EscalationMonitor;
use super::submission::SubmissionMachine;
use super::types::{CycleReport, ReconcileError, SchedulerStatus};
use crate::metrics::CYCLES;

/// Drives the state machines on a fixed interval.
pub struct ReconcileScheduler {
    submission: SubmissionMachine,
    assembly: AssemblyMachine,
    escalation: EscalationMonitor,
    cycle_interval: Duration,

    // Runtime state
    running: Arc<AtomicBool>,
    status: Arc<RwLock<SchedulerStatus>>,
}

impl ReconcileScheduler {
    pub fn new(
        submission: SubmissionMachine,
        assembly: AssemblyMachine,
        escalation: EscalationMonitor,
        cycle_interval: Duration,
    ) -> Self {
        Self {
            submission,
            assembly,
            escalation,
            cycle_interval,
            running: Arc::new(AtomicBool::new(false)),
            status: Arc::new(RwLock::new(SchedulerStatus::default())),
        }
    }

    /// Run every phase once.
    pub async fn run_cycle(&self) -> Result<CycleReport, ReconcileError> {
        let advanced = self.submission.advance().await?;
        let submissions_confirmed = self.submission.confirm().await?;
        let flushed = self.assembly.flush_unrecorded().await;
        let created = self.assembly.create().await?;
        let assemblies_confirmed = self.assembly.confirm().await?;
        let escalation = self.escalation.scan().await?;

        let report = CycleReport {
            advanced,
            submissions_confirmed,
            flushed,
            created,
            assemblies_confirmed,
            escalation,
        };

        if [
            &report.advanced,
            &report.submissions_confirmed,
            &report.flushed,
            &report.created,
            &report.assemblies_confirmed,
        ]
        .iter()
        .any(|phase| phase.is_active())
        {
            info!(
                "Cycle: advanced {}, confirmed {}, flushed {}, created {}, accessioned {}",
                report.advanced.committed,
                report.submissions_confirmed.committed,
                report.flushed.committed,
                report.created.registrar_calls,
                report.assemblies_confirmed.committed
            );
        }

        Ok(report)
    }

    /// Loop until `shutdown` fires or a fatal error occurs.
    ///
    /// Non-fatal errors are logged and the next cycle runs as usual.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ReconcileError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Reconcile scheduler already running");
            return Ok(());
        }

        info!(
            "Reconcile scheduler started (interval {}ms)",
            self.cycle_interval.as_millis()
        );

        let result = loop {
            match self.run_cycle().await {
                Ok(report) => {
                    debug!("Cycle finished: {:?}", report);
                    CYCLES.with_label_values(&["ok"]).inc();
                    self.record_cycle(None).await;
                }
                Err(e) if e.is_fatal() => {
                    error!("Fatal reconcile error: {}", e);
                    CYCLES.with_label_values(&["error"]).inc();
                    self.record_cycle(Some(e.to_string())).await;
                    break Err(e);
                }
                Err(e) => {
                    warn!("Reconcile cycle failed, retrying next cycle: {}", e);
                    CYCLES.with_label_values(&["error"]).inc();
                    self.record_cycle(Some(e.to_string())).await;
                }
            }

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Reconcile scheduler received shutdown signal");
                    break Ok(());
                }
                _ = tokio::time::sleep(self.cycle_interval) => {}
            }
        };

        self.running.store(false, Ordering::SeqCst);
        info!("Reconcile scheduler stopped");
        result
    }

    async fn record_cycle(&self, error: Option<String>) {
        let mut status = self.status.write().await;
        status.cycles_completed += 1;
        status.last_cycle_at = Some(Utc::now());
        status.last_error = error;
    }

    /// Get current scheduler status.
    pub async fn status(&self) -> SchedulerStatus {
        let mut status = self.status.read().await.clone();
        status.running = self.running.load(Ordering::Relaxed);
        status.unrecorded_outcomes = self.assembly.unrecorded().len();
        status
    }
}
