//! Reconciliation of local records with the registrar.
//!
//! Two state machines move records forward, an escalation monitor reports
//! records that stopped moving, and the scheduler runs all of them in a loop.
//! Every write is a conditional update on the expected prior status, so
//! several instances can share one store without double submission.

mod assembly;
mod config;
mod escalation;
mod retry;
mod scheduler;
mod submission;
mod types;

pub use assembly::{AssemblyMachine, UnrecordedOutcome};
pub use config::{EscalationConfig, ReconcilerConfig, MAX_INTERVAL_HOURS, MAX_INTERVAL_MINS};
pub use escalation::EscalationMonitor;
pub use retry::RetryPolicy;
pub use scheduler::ReconcileScheduler;
pub use submission::SubmissionMachine;
pub use types::{CycleReport, EscalationReport, PhaseReport, ReconcileError, SchedulerStatus};
