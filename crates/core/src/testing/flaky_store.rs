//! Record store wrapper with failure injection.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::record::{
    AssemblyChange, AssemblyRecord, EntryStatus, GroupKey, ProjectRecord, SampleRecord,
    SequenceKey, StoreError, SubmissionRecord, SubmissionStatus, SubmissionStore,
};

/// Delegates to an inner store, failing selected calls on demand.
///
/// # Example
///
/// ```rust,ignore
/// let store = Arc::new(FlakyStore::new(inner));
/// store.fail_next_updates_from(EntryStatus::Submitting, 3);
/// ```
pub struct FlakyStore {
    inner: Arc<dyn SubmissionStore>,
    /// Remaining failures, optionally limited to one expected status.
    failing_updates: Mutex<(Option<EntryStatus>, usize)>,
    failing_reads: AtomicBool,
    assembly_update_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn SubmissionStore>) -> Self {
        Self {
            inner,
            failing_updates: Mutex::new((None, 0)),
            failing_reads: AtomicBool::new(false),
            assembly_update_calls: AtomicUsize::new(0),
        }
    }

    /// Fail the next `n` calls to `update_assembly`.
    pub fn fail_next_assembly_updates(&self, n: usize) {
        *self.failing_updates.lock().unwrap() = (None, n);
    }

    /// Fail the next `n` calls to `update_assembly` that expect `expected`;
    /// other updates go through.
    pub fn fail_next_updates_from(&self, expected: EntryStatus, n: usize) {
        *self.failing_updates.lock().unwrap() = (Some(expected), n);
    }

    fn take_update_failure(&self, expected: EntryStatus) -> bool {
        let mut failing = self.failing_updates.lock().unwrap();
        let (filter, remaining) = &mut *failing;
        if *remaining == 0 || filter.is_some_and(|status| status != expected) {
            return false;
        }
        *remaining -= 1;
        true
    }

    /// Fail every list query until turned off.
    pub fn fail_reads(&self, failing: bool) {
        self.failing_reads.store(failing, Ordering::SeqCst);
    }

    /// Number of `update_assembly` calls seen, failed or not.
    pub fn assembly_update_calls(&self) -> usize {
        self.assembly_update_calls.load(Ordering::SeqCst)
    }

    fn injected() -> StoreError {
        StoreError::Database("injected failure".to_string())
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        Ok(())
    }
}

impl SubmissionStore for FlakyStore {
    fn submissions_with_status(
        &self,
        status: SubmissionStatus,
    ) -> Result<Vec<SubmissionRecord>, StoreError> {
        self.check_reads()?;
        self.inner.submissions_with_status(status)
    }

    fn get_submission(&self, key: &SequenceKey) -> Result<Option<SubmissionRecord>, StoreError> {
        self.inner.get_submission(key)
    }

    fn update_submission_status(
        &self,
        key: &SequenceKey,
        expected: SubmissionStatus,
        new: SubmissionStatus,
    ) -> Result<usize, StoreError> {
        self.inner.update_submission_status(key, expected, new)
    }

    fn get_sample(&self, key: &SequenceKey) -> Result<Option<SampleRecord>, StoreError> {
        self.inner.get_sample(key)
    }

    fn get_project(&self, group: &GroupKey) -> Result<Option<ProjectRecord>, StoreError> {
        self.inner.get_project(group)
    }

    fn get_assembly(&self, key: &SequenceKey) -> Result<Option<AssemblyRecord>, StoreError> {
        self.inner.get_assembly(key)
    }

    fn assemblies_with_status(
        &self,
        status: EntryStatus,
    ) -> Result<Vec<AssemblyRecord>, StoreError> {
        self.check_reads()?;
        self.inner.assemblies_with_status(status)
    }

    fn assemblies_started_before(
        &self,
        statuses: &[EntryStatus],
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<AssemblyRecord>, StoreError> {
        self.check_reads()?;
        self.inner.assemblies_started_before(statuses, cutoff)
    }

    fn insert_assembly(&self, record: &AssemblyRecord) -> Result<bool, StoreError> {
        self.inner.insert_assembly(record)
    }

    fn update_assembly(
        &self,
        key: &SequenceKey,
        expected: EntryStatus,
        change: &AssemblyChange,
    ) -> Result<usize, StoreError> {
        self.assembly_update_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_update_failure(expected) {
            return Err(Self::injected());
        }
        self.inner.update_assembly(key, expected, change)
    }

    fn count_assemblies_by_status(&self) -> Result<Vec<(EntryStatus, i64)>, StoreError> {
        self.check_reads()?;
        self.inner.count_assemblies_by_status()
    }
}
