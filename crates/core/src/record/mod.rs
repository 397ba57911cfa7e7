//! Submission, sample, project and assembly records and their storage.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteSubmissionStore;
pub use store::{StoreError, SubmissionStore};
pub use types::{
    AssemblyChange, AssemblyRecord, EntryStatus, GroupKey, ProjectRecord, ResultFields,
    SampleRecord, SequenceKey, SubmissionRecord, SubmissionStatus, UnknownStatus, ERZ_ACCESSION,
    PROJECT_ACCESSION, SAMPLE_ACCESSION,
};
