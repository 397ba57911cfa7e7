//! Types for the reconciler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{SequenceKey, StoreError};

/// Errors that can occur during a reconcile cycle.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A primary record is `SUBMITTING_ASSEMBLY` but has no assembly record.
    #[error("no assembly record for {0}")]
    MissingAssembly(SequenceKey),

    /// A row the assembly stage depends on does not exist.
    #[error("missing {table} row for {key}")]
    MissingDependency { table: &'static str, key: String },

    /// Record store error.
    #[error("record store error: {0}")]
    Store(#[from] StoreError),
}

impl ReconcileError {
    /// Consistency violations stop the process; anything else is retried by
    /// the next cycle.
    pub fn is_fatal(&self) -> bool {
        match self {
            ReconcileError::MissingAssembly(_) | ReconcileError::MissingDependency { .. } => true,
            ReconcileError::Store(_) => false,
        }
    }
}

/// What one state machine operation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    /// Records selected for this phase.
    pub examined: usize,
    /// Transitions that changed exactly one row.
    pub committed: usize,
    /// Records left alone this cycle (lost race, missing reference).
    pub skipped: usize,
    /// Registrar calls made.
    pub registrar_calls: usize,
    /// Create outcomes parked in the unrecorded ledger.
    pub unrecorded: usize,
}

impl PhaseReport {
    /// True if the phase did anything worth logging.
    pub fn is_active(&self) -> bool {
        self.committed > 0 || self.registrar_calls > 0 || self.unrecorded > 0
    }
}

/// What one escalation scan found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationReport {
    /// `HAS_ERRORS` / `SUBMITTING` records past the stuck threshold.
    pub stuck: usize,
    /// `WAITING` records past the waiting threshold.
    pub waiting: usize,
    /// Notifications the sink actually delivered.
    pub notified: usize,
}

/// Result of one full reconcile cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub advanced: PhaseReport,
    pub submissions_confirmed: PhaseReport,
    pub flushed: PhaseReport,
    pub created: PhaseReport,
    pub assemblies_confirmed: PhaseReport,
    pub escalation: EscalationReport,
}

/// Current status of the scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// Whether the loop is running.
    pub running: bool,
    /// Cycles finished, successful or not.
    pub cycles_completed: u64,
    /// When the last cycle finished.
    pub last_cycle_at: Option<DateTime<Utc>>,
    /// Error from the last cycle, cleared by the next successful one.
    pub last_error: Option<String>,
    /// Registrar outcomes still waiting to be written.
    pub unrecorded_outcomes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let key = SequenceKey::new("LOC_1", 1);
        assert!(ReconcileError::MissingAssembly(key.clone()).is_fatal());
        assert!(ReconcileError::MissingDependency {
            table: "sample_table",
            key: key.to_string(),
        }
        .is_fatal());
        assert!(!ReconcileError::Store(StoreError::Database("busy".to_string())).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = ReconcileError::MissingAssembly(SequenceKey::new("LOC_1", 2));
        assert_eq!(err.to_string(), "no assembly record for LOC_1.2");

        let err = ReconcileError::MissingDependency {
            table: "project_table",
            key: "7/west-nile".to_string(),
        };
        assert_eq!(err.to_string(), "missing project_table row for 7/west-nile");
    }

    #[test]
    fn test_status_serialization() {
        let status = SchedulerStatus {
            running: true,
            cycles_completed: 3,
            ..Default::default()
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["running"], true);
        assert_eq!(json["cycles_completed"], 3);
        assert!(json["last_error"].is_null());
    }
}
