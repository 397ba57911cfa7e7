//! Primary record state machine.
//!
//! Moves primary records from `SUBMITTED_SAMPLE` through
//! `SUBMITTING_ASSEMBLY` to `SUBMITTED_ALL`, following the assembly record.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::types::{PhaseReport, ReconcileError};
use crate::metrics::TRANSITIONS;
use crate::record::{AssemblyRecord, EntryStatus, SequenceKey, SubmissionStatus, SubmissionStore};

pub struct SubmissionMachine {
    store: Arc<dyn SubmissionStore>,
}

impl SubmissionMachine {
    pub fn new(store: Arc<dyn SubmissionStore>) -> Self {
        Self { store }
    }

    /// Create assembly records for submissions whose sample is registered,
    /// and mark them `SUBMITTING_ASSEMBLY` (or `SUBMITTED_ALL` if the
    /// assembly already went through).
    pub async fn advance(&self) -> Result<PhaseReport, ReconcileError> {
        let mut report = PhaseReport::default();
        let records = self
            .store
            .submissions_with_status(SubmissionStatus::SubmittedSample)?;
        report.examined = records.len();

        for record in records {
            let key = &record.key;
            match self.store.get_assembly(key)? {
                None => {
                    let assembly = AssemblyRecord::ready(key.clone(), Utc::now());
                    if !self.store.insert_assembly(&assembly)? {
                        debug!("Assembly record for {} created concurrently", key);
                        report.skipped += 1;
                        continue;
                    }
                    info!("Created assembly record for {}", key);
                    self.transition(
                        key,
                        SubmissionStatus::SubmittedSample,
                        SubmissionStatus::SubmittingAssembly,
                        &mut report,
                    )?;
                }
                Some(assembly) => {
                    let target = match assembly.status {
                        EntryStatus::Submitted => SubmissionStatus::SubmittedAll,
                        EntryStatus::Ready
                        | EntryStatus::Submitting
                        | EntryStatus::Waiting
                        | EntryStatus::HasErrors => SubmissionStatus::SubmittingAssembly,
                    };
                    self.transition(key, SubmissionStatus::SubmittedSample, target, &mut report)?;
                }
            }
        }

        Ok(report)
    }

    /// Mark `SUBMITTING_ASSEMBLY` records whose assembly is `SUBMITTED` as
    /// `SUBMITTED_ALL`.
    ///
    /// A record in `SUBMITTING_ASSEMBLY` without an assembly record means
    /// something bypassed [`advance`](Self::advance); that is fatal.
    pub async fn confirm(&self) -> Result<PhaseReport, ReconcileError> {
        let mut report = PhaseReport::default();
        let records = self
            .store
            .submissions_with_status(SubmissionStatus::SubmittingAssembly)?;
        report.examined = records.len();

        for record in records {
            let key = &record.key;
            let assembly = self
                .store
                .get_assembly(key)?
                .ok_or_else(|| ReconcileError::MissingAssembly(key.clone()))?;

            if assembly.status == EntryStatus::Submitted {
                self.transition(
                    key,
                    SubmissionStatus::SubmittingAssembly,
                    SubmissionStatus::SubmittedAll,
                    &mut report,
                )?;
            }
        }

        Ok(report)
    }

    fn transition(
        &self,
        key: &SequenceKey,
        expected: SubmissionStatus,
        new: SubmissionStatus,
        report: &mut PhaseReport,
    ) -> Result<(), ReconcileError> {
        let changed = self.store.update_submission_status(key, expected, new)?;
        if changed == 1 {
            info!("Submission {}: {} -> {}", key, expected, new);
            TRANSITIONS
                .with_label_values(&["submission", new.as_str()])
                .inc();
            report.committed += 1;
        } else {
            debug!(
                "Submission {} no longer {}, leaving it for the next cycle",
                key, expected
            );
            report.skipped += 1;
        }
        Ok(())
    }
}
