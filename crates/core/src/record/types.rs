//! Record types for the submission and assembly tables.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field name of the registrar's reference for a created assembly.
pub const ERZ_ACCESSION: &str = "erz_accession";

/// Field name of the sample accession in a sample record's result.
pub const SAMPLE_ACCESSION: &str = "ena_sample_accession";

/// Field name of the study accession in a project record's result.
pub const PROJECT_ACCESSION: &str = "bioproject_accession";

/// Result fields returned by the registrar (accessions and references).
pub type ResultFields = BTreeMap<String, String>;

/// Identifies one sequence submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceKey {
    pub accession: String,
    pub version: i64,
}

impl SequenceKey {
    pub fn new(accession: impl Into<String>, version: i64) -> Self {
        Self {
            accession: accession.into(),
            version,
        }
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.accession, self.version)
    }
}

/// Identifies the submitting group's project for one organism.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub group_id: i64,
    pub organism: String,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group_id, self.organism)
    }
}

/// Error returned when a stored status string is not a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

/// Coarse workflow status of a primary submission record.
///
/// Only `SubmittedSample`, `SubmittingAssembly` and `SubmittedAll` are written
/// by the reconciler; the rest are produced by upstream stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    ReadyToSubmit,
    SubmittingProject,
    SubmittedProject,
    SubmittingSample,
    SubmittedSample,
    SubmittingAssembly,
    SubmittedAll,
    SentToLoculus,
    HasErrorsProject,
    HasErrorsSample,
    HasErrorsAssembly,
    HasErrorsExtMetadataUpload,
}

impl SubmissionStatus {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::ReadyToSubmit => "READY_TO_SUBMIT",
            SubmissionStatus::SubmittingProject => "SUBMITTING_PROJECT",
            SubmissionStatus::SubmittedProject => "SUBMITTED_PROJECT",
            SubmissionStatus::SubmittingSample => "SUBMITTING_SAMPLE",
            SubmissionStatus::SubmittedSample => "SUBMITTED_SAMPLE",
            SubmissionStatus::SubmittingAssembly => "SUBMITTING_ASSEMBLY",
            SubmissionStatus::SubmittedAll => "SUBMITTED_ALL",
            SubmissionStatus::SentToLoculus => "SENT_TO_LOCULUS",
            SubmissionStatus::HasErrorsProject => "HAS_ERRORS_PROJECT",
            SubmissionStatus::HasErrorsSample => "HAS_ERRORS_SAMPLE",
            SubmissionStatus::HasErrorsAssembly => "HAS_ERRORS_ASSEMBLY",
            SubmissionStatus::HasErrorsExtMetadataUpload => "HAS_ERRORS_EXT_METADATA_UPLOAD",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "READY_TO_SUBMIT" => SubmissionStatus::ReadyToSubmit,
            "SUBMITTING_PROJECT" => SubmissionStatus::SubmittingProject,
            "SUBMITTED_PROJECT" => SubmissionStatus::SubmittedProject,
            "SUBMITTING_SAMPLE" => SubmissionStatus::SubmittingSample,
            "SUBMITTED_SAMPLE" => SubmissionStatus::SubmittedSample,
            "SUBMITTING_ASSEMBLY" => SubmissionStatus::SubmittingAssembly,
            "SUBMITTED_ALL" => SubmissionStatus::SubmittedAll,
            "SENT_TO_LOCULUS" => SubmissionStatus::SentToLoculus,
            "HAS_ERRORS_PROJECT" => SubmissionStatus::HasErrorsProject,
            "HAS_ERRORS_SAMPLE" => SubmissionStatus::HasErrorsSample,
            "HAS_ERRORS_ASSEMBLY" => SubmissionStatus::HasErrorsAssembly,
            "HAS_ERRORS_EXT_METADATA_UPLOAD" => SubmissionStatus::HasErrorsExtMetadataUpload,
            other => return Err(UnknownStatus(other.to_string())),
        })
    }
}

/// Fine-grained status of an assembly, sample or project record.
///
/// ```text
/// READY -> SUBMITTING -> WAITING -> SUBMITTED
///              |
///              +-------> HAS_ERRORS
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Ready,
    Submitting,
    Waiting,
    Submitted,
    HasErrors,
}

impl EntryStatus {
    /// All variants, in transition order.
    pub const ALL: [EntryStatus; 5] = [
        EntryStatus::Ready,
        EntryStatus::Submitting,
        EntryStatus::Waiting,
        EntryStatus::Submitted,
        EntryStatus::HasErrors,
    ];

    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Ready => "READY",
            EntryStatus::Submitting => "SUBMITTING",
            EntryStatus::Waiting => "WAITING",
            EntryStatus::Submitted => "SUBMITTED",
            EntryStatus::HasErrors => "HAS_ERRORS",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "READY" => EntryStatus::Ready,
            "SUBMITTING" => EntryStatus::Submitting,
            "WAITING" => EntryStatus::Waiting,
            "SUBMITTED" => EntryStatus::Submitted,
            "HAS_ERRORS" => EntryStatus::HasErrors,
            other => return Err(UnknownStatus(other.to_string())),
        })
    }
}

/// A primary submission record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub key: SequenceKey,
    pub status_all: SubmissionStatus,
    pub group_id: i64,
    pub organism: String,
    /// Submitting center, passed through to the registrar.
    pub center_name: Option<String>,
    /// Free-form sequencing metadata.
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Segment name to sequence; `None` for segments that were not sequenced.
    pub unaligned_nucleotide_sequences: BTreeMap<String, Option<String>>,
    pub started_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            group_id: self.group_id,
            organism: self.organism.clone(),
        }
    }
}

/// Upstream sample registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub key: SequenceKey,
    pub status: EntryStatus,
    pub result: Option<ResultFields>,
}

/// Upstream project registration for a group and organism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub group_key: GroupKey,
    pub status: EntryStatus,
    pub result: Option<ResultFields>,
}

/// Derived record tracking registrar submission of an assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyRecord {
    pub key: SequenceKey,
    pub status: EntryStatus,
    pub result: Option<ResultFields>,
    pub errors: Option<Vec<String>>,
    pub started_at: DateTime<Utc>,
    /// Set only when the registrar confirmed the assembly.
    pub finished_at: Option<DateTime<Utc>>,
}

impl AssemblyRecord {
    /// A fresh record awaiting creation.
    pub fn ready(key: SequenceKey, started_at: DateTime<Utc>) -> Self {
        Self {
            key,
            status: EntryStatus::Ready,
            result: None,
            errors: None,
            started_at,
            finished_at: None,
        }
    }

    /// The registrar's reference for this assembly, once created.
    pub fn external_reference(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(|r| r.get(ERZ_ACCESSION))
            .map(String::as_str)
    }
}

/// Fields written by a conditional assembly update.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyChange {
    pub status: EntryStatus,
    pub result: Option<ResultFields>,
    pub errors: Option<Vec<String>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl AssemblyChange {
    /// Only move the status.
    pub fn status(status: EntryStatus) -> Self {
        Self {
            status,
            result: None,
            errors: None,
            finished_at: None,
        }
    }

    pub fn with_result(mut self, result: ResultFields) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_finished_at(mut self, at: DateTime<Utc>) -> Self {
        self.finished_at = Some(at);
        self
    }
}
