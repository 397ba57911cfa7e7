//! Assembly record state machine.
//!
//! ```text
//! READY -> SUBMITTING -> WAITING -> SUBMITTED
//!              |
//!              +-------> HAS_ERRORS
//! ```
//!
//! `READY -> SUBMITTING` is the claim: only the instance whose conditional
//! update changed the row calls the registrar. Outcomes that could not be
//! written after the registrar call are kept in a process-local ledger and
//! re-attempted at the start of the next cycle. A record whose manifest
//! cannot be built is claimed and moved to `HAS_ERRORS` without a registrar
//! call.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::retry::RetryPolicy;
use super::types::{PhaseReport, ReconcileError};
use crate::manifest::{ManifestBuilder, ManifestInput};
use crate::metrics::{
    CONFIRM_BATCHES_SKIPPED, REGISTRAR_REQUESTS, TRANSITIONS, UNRECORDED_OUTCOMES,
};
use crate::record::{
    AssemblyChange, AssemblyRecord, EntryStatus, ResultFields, SequenceKey, SubmissionStore,
    ERZ_ACCESSION,
};
use crate::registrar::{Outcome, Registrar};

/// A registrar outcome whose status write failed every attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct UnrecordedOutcome {
    pub key: SequenceKey,
    pub change: AssemblyChange,
}

pub struct AssemblyMachine {
    store: Arc<dyn SubmissionStore>,
    registrar: Arc<dyn Registrar>,
    builder: ManifestBuilder,
    retry: RetryPolicy,
    check_interval: Duration,
    last_check: Mutex<Option<DateTime<Utc>>>,
    unrecorded: Mutex<Vec<UnrecordedOutcome>>,
}

impl AssemblyMachine {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        registrar: Arc<dyn Registrar>,
        builder: ManifestBuilder,
        retry: RetryPolicy,
        check_interval: Duration,
    ) -> Self {
        Self {
            store,
            registrar,
            builder,
            retry,
            check_interval,
            last_check: Mutex::new(None),
            unrecorded: Mutex::new(Vec::new()),
        }
    }

    /// Outcomes waiting to be written.
    pub fn unrecorded(&self) -> Vec<UnrecordedOutcome> {
        lock(&self.unrecorded).clone()
    }

    /// When the last batch of registrar checks ran.
    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        *lock(&self.last_check)
    }

    /// Submit every `READY` assembly this instance manages to claim.
    pub async fn create(&self) -> Result<PhaseReport, ReconcileError> {
        let mut report = PhaseReport::default();
        let records = self.store.assemblies_with_status(EntryStatus::Ready)?;
        report.examined = records.len();

        for record in records {
            let key = record.key;

            let submission = self.store.get_submission(&key)?.ok_or_else(|| {
                ReconcileError::MissingDependency {
                    table: "submission_table",
                    key: key.to_string(),
                }
            })?;
            let sample =
                self.store
                    .get_sample(&key)?
                    .ok_or_else(|| ReconcileError::MissingDependency {
                        table: "sample_table",
                        key: key.to_string(),
                    })?;
            let group = submission.group_key();
            let project = self.store.get_project(&group)?.ok_or_else(|| {
                ReconcileError::MissingDependency {
                    table: "project_table",
                    key: group.to_string(),
                }
            })?;

            // A manifest that cannot be built is this record's problem only.
            let manifest = self.builder.build(
                ManifestInput {
                    submission: &submission,
                    sample: &sample,
                    project: &project,
                },
                Utc::now(),
            );

            let claimed = self.store.update_assembly(
                &key,
                EntryStatus::Ready,
                &AssemblyChange::status(EntryStatus::Submitting),
            )?;
            if claimed != 1 {
                debug!("Assembly {} claimed by another instance", key);
                report.skipped += 1;
                continue;
            }
            TRANSITIONS
                .with_label_values(&["assembly", EntryStatus::Submitting.as_str()])
                .inc();

            let change = match manifest {
                Ok(manifest) => {
                    info!(
                        "Submitting assembly {} as '{}'",
                        key, manifest.assembly_name
                    );
                    let outcome = self
                        .registrar
                        .create(&manifest, submission.center_name.as_deref())
                        .await;
                    report.registrar_calls += 1;
                    REGISTRAR_REQUESTS
                        .with_label_values(&["create", outcome.label()])
                        .inc();
                    Self::create_outcome_change(&key, outcome)
                }
                Err(e) => {
                    warn!("Cannot build manifest for assembly {}: {}", key, e);
                    AssemblyChange::status(EntryStatus::HasErrors)
                        .with_errors(vec![e.to_string()])
                }
            };

            self.record_outcome(key, change, &mut report).await;
        }

        Ok(report)
    }

    fn create_outcome_change(key: &SequenceKey, outcome: Outcome) -> AssemblyChange {
        match outcome {
            Outcome::Results(results) => {
                info!("Assembly {} created upstream: {:?}", key, results);
                AssemblyChange::status(EntryStatus::Waiting).with_result(results)
            }
            Outcome::Errors(errors) => {
                warn!("Assembly {} rejected by registrar: {:?}", key, errors);
                AssemblyChange::status(EntryStatus::HasErrors).with_errors(errors)
            }
            Outcome::Pending => {
                warn!("Registrar returned no results for assembly {}", key);
                AssemblyChange::status(EntryStatus::HasErrors)
                    .with_errors(vec!["registrar returned no results".to_string()])
            }
        }
    }

    /// Write the status that follows a registrar call, or park it in the
    /// ledger if the store keeps failing. The registrar is never called again.
    async fn record_outcome(
        &self,
        key: SequenceKey,
        change: AssemblyChange,
        report: &mut PhaseReport,
    ) {
        let written = self
            .retry
            .run(&key, || {
                self.store
                    .update_assembly(&key, EntryStatus::Submitting, &change)
            })
            .await;

        match written {
            Ok(1) => {
                TRANSITIONS
                    .with_label_values(&["assembly", change.status.as_str()])
                    .inc();
                report.committed += 1;
            }
            Ok(_) => {
                warn!(
                    "Assembly {} left SUBMITTING before its outcome was written; dropping {:?}",
                    key, change
                );
                report.skipped += 1;
            }
            Err(e) => {
                warn!(
                    "Could not record registrar outcome for {} after {} attempts: {}",
                    key,
                    self.retry.max_attempts(),
                    e
                );
                let mut ledger = lock(&self.unrecorded);
                ledger.push(UnrecordedOutcome { key, change });
                UNRECORDED_OUTCOMES.set(ledger.len() as i64);
                report.unrecorded += 1;
            }
        }
    }

    /// Re-attempt writes parked by [`create`](Self::create).
    ///
    /// An entry is dropped once written, or once its record has left
    /// `SUBMITTING` some other way.
    pub async fn flush_unrecorded(&self) -> PhaseReport {
        let pending = std::mem::take(&mut *lock(&self.unrecorded));
        let mut report = PhaseReport {
            examined: pending.len(),
            ..Default::default()
        };
        let mut kept = Vec::new();

        for entry in pending {
            match self.store.update_assembly(
                &entry.key,
                EntryStatus::Submitting,
                &entry.change,
            ) {
                Ok(1) => {
                    info!(
                        "Recorded deferred outcome for {}: {}",
                        entry.key, entry.change.status
                    );
                    TRANSITIONS
                        .with_label_values(&["assembly", entry.change.status.as_str()])
                        .inc();
                    report.committed += 1;
                }
                Ok(_) => {
                    warn!(
                        "Assembly {} is no longer SUBMITTING; dropping deferred outcome {:?}",
                        entry.key, entry.change
                    );
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(
                        "Deferred outcome for {} still unrecorded: {}",
                        entry.key, e
                    );
                    kept.push(entry);
                }
            }
        }

        report.unrecorded = kept.len();
        let mut ledger = lock(&self.unrecorded);
        ledger.extend(kept);
        UNRECORDED_OUTCOMES.set(ledger.len() as i64);
        report
    }

    /// Poll the registrar for `WAITING` assemblies.
    pub async fn confirm(&self) -> Result<PhaseReport, ReconcileError> {
        self.confirm_at(Utc::now()).await
    }

    /// [`confirm`](Self::confirm) with an explicit clock.
    ///
    /// At most one batch of checks runs per check interval.
    pub async fn confirm_at(&self, now: DateTime<Utc>) -> Result<PhaseReport, ReconcileError> {
        let mut report = PhaseReport::default();

        if let Some(last) = self.last_check() {
            if now - self.check_interval <= last {
                debug!("Registrar checked at {}, skipping confirm", last);
                CONFIRM_BATCHES_SKIPPED.inc();
                return Ok(report);
            }
        }

        let records = self.store.assemblies_with_status(EntryStatus::Waiting)?;
        report.examined = records.len();

        for record in records {
            let Some(reference) = record.external_reference() else {
                warn!(
                    "Assembly {} is WAITING without {}, skipping",
                    record.key, ERZ_ACCESSION
                );
                report.skipped += 1;
                continue;
            };

            let outcome = self.registrar.check(reference).await;
            report.registrar_calls += 1;
            REGISTRAR_REQUESTS
                .with_label_values(&["check", outcome.label()])
                .inc();

            match outcome {
                Outcome::Results(results) => {
                    self.record_confirmation(&record, results, now, &mut report)
                        .await;
                }
                Outcome::Pending => {
                    debug!("Assembly {} ({}) still processing", record.key, reference);
                }
                Outcome::Errors(errors) => {
                    warn!(
                        "Registrar check for {} ({}) failed: {:?}",
                        record.key, reference, errors
                    );
                }
            }
        }

        if report.registrar_calls > 0 {
            *lock(&self.last_check) = Some(now);
        }

        Ok(report)
    }

    async fn record_confirmation(
        &self,
        record: &AssemblyRecord,
        results: ResultFields,
        now: DateTime<Utc>,
        report: &mut PhaseReport,
    ) {
        let key = &record.key;
        let mut merged = record.result.clone().unwrap_or_default();
        merged.extend(results);
        let change = AssemblyChange::status(EntryStatus::Submitted)
            .with_result(merged)
            .with_finished_at(now);

        // A failed write leaves the record WAITING; the next check repeats it.
        match self
            .retry
            .run(key, || {
                self.store
                    .update_assembly(key, EntryStatus::Waiting, &change)
            })
            .await
        {
            Ok(1) => {
                info!("Assembly {} accessioned: {:?}", key, change.result);
                TRANSITIONS
                    .with_label_values(&["assembly", EntryStatus::Submitted.as_str()])
                    .inc();
                report.committed += 1;
            }
            Ok(_) => {
                debug!("Assembly {} no longer WAITING", key);
                report.skipped += 1;
            }
            Err(e) => {
                warn!("Could not record confirmation for {}: {}", key, e);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
