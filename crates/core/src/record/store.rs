//! Record store trait and error type.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{
    AssemblyChange, AssemblyRecord, EntryStatus, GroupKey, ProjectRecord, SampleRecord,
    SequenceKey, SubmissionRecord, SubmissionStatus,
};

/// Error type for record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database failed.
    #[error("database error: {0}")]
    Database(String),

    /// A stored row could not be decoded into a record.
    #[error("corrupt row for {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Storage backend for the submission, sample, project and assembly tables.
///
/// Every mutation is conditional: it names the status the caller expects the
/// row to be in and returns how many rows actually changed. A caller must
/// treat anything other than `1` as "transition not committed".
pub trait SubmissionStore: Send + Sync {
    /// Primary records in the given status.
    fn submissions_with_status(
        &self,
        status: SubmissionStatus,
    ) -> Result<Vec<SubmissionRecord>, StoreError>;

    /// Primary record by key.
    fn get_submission(&self, key: &SequenceKey) -> Result<Option<SubmissionRecord>, StoreError>;

    /// Move a primary record to `new`, only if it is currently `expected`.
    fn update_submission_status(
        &self,
        key: &SequenceKey,
        expected: SubmissionStatus,
        new: SubmissionStatus,
    ) -> Result<usize, StoreError>;

    /// Sample registration by key.
    fn get_sample(&self, key: &SequenceKey) -> Result<Option<SampleRecord>, StoreError>;

    /// Project registration by group.
    fn get_project(&self, group: &GroupKey) -> Result<Option<ProjectRecord>, StoreError>;

    /// Assembly record by key.
    fn get_assembly(&self, key: &SequenceKey) -> Result<Option<AssemblyRecord>, StoreError>;

    /// Assembly records in the given status.
    fn assemblies_with_status(&self, status: EntryStatus)
        -> Result<Vec<AssemblyRecord>, StoreError>;

    /// Assembly records in any of `statuses` that started before `cutoff`.
    fn assemblies_started_before(
        &self,
        statuses: &[EntryStatus],
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<AssemblyRecord>, StoreError>;

    /// Insert a new assembly record.
    ///
    /// Returns `false` if a record with the same key already exists.
    fn insert_assembly(&self, record: &AssemblyRecord) -> Result<bool, StoreError>;

    /// Apply `change` to an assembly record, only if it is currently `expected`.
    fn update_assembly(
        &self,
        key: &SequenceKey,
        expected: EntryStatus,
        change: &AssemblyChange,
    ) -> Result<usize, StoreError>;

    /// Number of assembly records in each status.
    fn count_assemblies_by_status(&self) -> Result<Vec<(EntryStatus, i64)>, StoreError>;
}
