//! SQLite-backed record store implementation.
//!
//! All conversion between SQL rows and typed records happens here.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::de::DeserializeOwned;

use super::{
    AssemblyChange, AssemblyRecord, EntryStatus, GroupKey, ProjectRecord, SampleRecord,
    SequenceKey, StoreError, SubmissionRecord, SubmissionStatus, SubmissionStore,
};

const SUBMISSION_COLUMNS: &str = "accession, version, status_all, group_id, organism, center_name, metadata, unaligned_nucleotide_sequences, started_at";

const ASSEMBLY_COLUMNS: &str = "accession, version, status, result, errors, started_at, finished_at";

/// SQLite-backed record store.
pub struct SqliteSubmissionStore {
    conn: Mutex<Connection>,
}

impl SqliteSubmissionStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS submission_table (
                accession TEXT NOT NULL,
                version INTEGER NOT NULL,
                status_all TEXT NOT NULL,
                group_id INTEGER NOT NULL,
                organism TEXT NOT NULL,
                center_name TEXT,
                metadata TEXT NOT NULL DEFAULT '{}',
                unaligned_nucleotide_sequences TEXT NOT NULL DEFAULT '{}',
                started_at TEXT NOT NULL,
                PRIMARY KEY (accession, version)
            );

            CREATE TABLE IF NOT EXISTS sample_table (
                accession TEXT NOT NULL,
                version INTEGER NOT NULL,
                status TEXT NOT NULL,
                result TEXT,
                PRIMARY KEY (accession, version)
            );

            CREATE TABLE IF NOT EXISTS project_table (
                group_id INTEGER NOT NULL,
                organism TEXT NOT NULL,
                status TEXT NOT NULL,
                result TEXT,
                PRIMARY KEY (group_id, organism)
            );

            CREATE TABLE IF NOT EXISTS assembly_table (
                accession TEXT NOT NULL,
                version INTEGER NOT NULL,
                status TEXT NOT NULL,
                result TEXT,
                errors TEXT,
                started_at TEXT NOT NULL,
                finished_at TEXT,
                PRIMARY KEY (accession, version)
            );

            CREATE INDEX IF NOT EXISTS idx_submission_status ON submission_table(status_all);
            CREATE INDEX IF NOT EXISTS idx_assembly_status ON assembly_table(status);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection mutex poisoned".to_string()))
    }

    /// Insert a primary record. Upstream stages own this table; the
    /// reconciler only reads it and moves its status.
    pub fn insert_submission(&self, record: &SubmissionRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO submission_table ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                SUBMISSION_COLUMNS
            ),
            params![
                record.key.accession,
                record.key.version,
                record.status_all.as_str(),
                record.group_id,
                record.organism,
                record.center_name,
                to_json(&record.metadata)?,
                to_json(&record.unaligned_nucleotide_sequences)?,
                format_timestamp(&record.started_at),
            ],
        )?;
        Ok(())
    }

    /// Insert a sample registration (written by the upstream sample stage).
    pub fn insert_sample(&self, record: &SampleRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sample_table (accession, version, status, result) VALUES (?, ?, ?, ?)",
            params![
                record.key.accession,
                record.key.version,
                record.status.as_str(),
                record.result.as_ref().map(to_json).transpose()?,
            ],
        )?;
        Ok(())
    }

    /// Insert a project registration (written by the upstream project stage).
    pub fn insert_project(&self, record: &ProjectRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO project_table (group_id, organism, status, result) VALUES (?, ?, ?, ?)",
            params![
                record.group_key.group_id,
                record.group_key.organism,
                record.status.as_str(),
                record.result.as_ref().map(to_json).transpose()?,
            ],
        )?;
        Ok(())
    }

    fn query_assemblies(
        conn: &Connection,
        sql: &str,
        params: Vec<String>,
    ) -> Result<Vec<AssemblyRecord>, StoreError> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), AssemblyRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }
}

/// Raw assembly row, decoded in two steps so that JSON and status parse
/// failures surface as `StoreError::Corrupt` rather than SQL errors.
struct AssemblyRow {
    accession: String,
    version: i64,
    status: String,
    result: Option<String>,
    errors: Option<String>,
    started_at: String,
    finished_at: Option<String>,
}

impl AssemblyRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            accession: row.get(0)?,
            version: row.get(1)?,
            status: row.get(2)?,
            result: row.get(3)?,
            errors: row.get(4)?,
            started_at: row.get(5)?,
            finished_at: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<AssemblyRecord, StoreError> {
        let key = SequenceKey::new(self.accession, self.version);
        let corrupt = |reason: String| StoreError::Corrupt {
            key: key.to_string(),
            reason,
        };

        let status = self
            .status
            .parse::<EntryStatus>()
            .map_err(|e| corrupt(e.to_string()))?;
        let result = self
            .result
            .map(|json| from_json(&json))
            .transpose()
            .map_err(corrupt)?;
        let errors = self
            .errors
            .map(|json| from_json(&json))
            .transpose()
            .map_err(corrupt)?;
        let started_at = parse_timestamp(&self.started_at).map_err(corrupt)?;
        let finished_at = self
            .finished_at
            .map(|ts| parse_timestamp(&ts))
            .transpose()
            .map_err(corrupt)?;

        Ok(AssemblyRecord {
            key,
            status,
            result,
            errors,
            started_at,
            finished_at,
        })
    }
}

struct SubmissionRow {
    accession: String,
    version: i64,
    status_all: String,
    group_id: i64,
    organism: String,
    center_name: Option<String>,
    metadata: String,
    unaligned_nucleotide_sequences: String,
    started_at: String,
}

impl SubmissionRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            accession: row.get(0)?,
            version: row.get(1)?,
            status_all: row.get(2)?,
            group_id: row.get(3)?,
            organism: row.get(4)?,
            center_name: row.get(5)?,
            metadata: row.get(6)?,
            unaligned_nucleotide_sequences: row.get(7)?,
            started_at: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<SubmissionRecord, StoreError> {
        let key = SequenceKey::new(self.accession, self.version);
        let corrupt = |reason: String| StoreError::Corrupt {
            key: key.to_string(),
            reason,
        };

        Ok(SubmissionRecord {
            status_all: self
                .status_all
                .parse::<SubmissionStatus>()
                .map_err(|e| corrupt(e.to_string()))?,
            group_id: self.group_id,
            organism: self.organism,
            center_name: self.center_name,
            metadata: from_json(&self.metadata).map_err(corrupt)?,
            unaligned_nucleotide_sequences: from_json(&self.unaligned_nucleotide_sequences)
                .map_err(corrupt)?,
            started_at: parse_timestamp(&self.started_at).map_err(corrupt)?,
            key,
        })
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Database(e.to_string()))
}

fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| e.to_string())
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(ts: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp {:?}: {}", ts, e))
}

impl SubmissionStore for SqliteSubmissionStore {
    fn submissions_with_status(
        &self,
        status: SubmissionStatus,
    ) -> Result<Vec<SubmissionRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM submission_table WHERE status_all = ? ORDER BY started_at ASC",
            SUBMISSION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![status.as_str()], SubmissionRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    fn get_submission(&self, key: &SequenceKey) -> Result<Option<SubmissionRecord>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM submission_table WHERE accession = ? AND version = ?",
                SUBMISSION_COLUMNS
            ),
            params![key.accession, key.version],
            SubmissionRow::from_row,
        )
        .optional()?
        .map(SubmissionRow::into_record)
        .transpose()
    }

    fn update_submission_status(
        &self,
        key: &SequenceKey,
        expected: SubmissionStatus,
        new: SubmissionStatus,
    ) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE submission_table SET status_all = ? WHERE accession = ? AND version = ? AND status_all = ?",
            params![new.as_str(), key.accession, key.version, expected.as_str()],
        )?;
        Ok(affected)
    }

    fn get_sample(&self, key: &SequenceKey) -> Result<Option<SampleRecord>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT status, result FROM sample_table WHERE accession = ? AND version = ?",
                params![key.accession, key.version],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;

        let Some((status, result)) = row else {
            return Ok(None);
        };
        let corrupt = |reason: String| StoreError::Corrupt {
            key: key.to_string(),
            reason,
        };
        Ok(Some(SampleRecord {
            key: key.clone(),
            status: status.parse().map_err(|e: super::UnknownStatus| corrupt(e.to_string()))?,
            result: result.map(|json| from_json(&json)).transpose().map_err(corrupt)?,
        }))
    }

    fn get_project(&self, group: &GroupKey) -> Result<Option<ProjectRecord>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT status, result FROM project_table WHERE group_id = ? AND organism = ?",
                params![group.group_id, group.organism],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;

        let Some((status, result)) = row else {
            return Ok(None);
        };
        let corrupt = |reason: String| StoreError::Corrupt {
            key: group.to_string(),
            reason,
        };
        Ok(Some(ProjectRecord {
            group_key: group.clone(),
            status: status.parse().map_err(|e: super::UnknownStatus| corrupt(e.to_string()))?,
            result: result.map(|json| from_json(&json)).transpose().map_err(corrupt)?,
        }))
    }

    fn get_assembly(&self, key: &SequenceKey) -> Result<Option<AssemblyRecord>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM assembly_table WHERE accession = ? AND version = ?",
                ASSEMBLY_COLUMNS
            ),
            params![key.accession, key.version],
            AssemblyRow::from_row,
        )
        .optional()?
        .map(AssemblyRow::into_record)
        .transpose()
    }

    fn assemblies_with_status(
        &self,
        status: EntryStatus,
    ) -> Result<Vec<AssemblyRecord>, StoreError> {
        let conn = self.lock()?;
        Self::query_assemblies(
            &conn,
            &format!(
                "SELECT {} FROM assembly_table WHERE status = ? ORDER BY started_at ASC",
                ASSEMBLY_COLUMNS
            ),
            vec![status.as_str().to_string()],
        )
    }

    fn assemblies_started_before(
        &self,
        statuses: &[EntryStatus],
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<AssemblyRecord>, StoreError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;

        // Fixed-width UTC timestamps compare lexicographically in time order.
        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM assembly_table WHERE status IN ({}) AND started_at < ? ORDER BY started_at ASC",
            ASSEMBLY_COLUMNS, placeholders
        );
        let mut params: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        params.push(format_timestamp(&cutoff));

        Self::query_assemblies(&conn, &sql, params)
    }

    fn insert_assembly(&self, record: &AssemblyRecord) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO assembly_table ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
                ASSEMBLY_COLUMNS
            ),
            params![
                record.key.accession,
                record.key.version,
                record.status.as_str(),
                record.result.as_ref().map(to_json).transpose()?,
                record.errors.as_ref().map(to_json).transpose()?,
                format_timestamp(&record.started_at),
                record.finished_at.map(|t| format_timestamp(&t)),
            ],
        )?;
        Ok(inserted == 1)
    }

    fn update_assembly(
        &self,
        key: &SequenceKey,
        expected: EntryStatus,
        change: &AssemblyChange,
    ) -> Result<usize, StoreError> {
        let conn = self.lock()?;

        // COALESCE keeps the stored value when the change leaves a field unset.
        let affected = conn.execute(
            "UPDATE assembly_table
             SET status = ?,
                 result = COALESCE(?, result),
                 errors = COALESCE(?, errors),
                 finished_at = COALESCE(?, finished_at)
             WHERE accession = ? AND version = ? AND status = ?",
            params![
                change.status.as_str(),
                change.result.as_ref().map(to_json).transpose()?,
                change.errors.as_ref().map(to_json).transpose()?,
                change.finished_at.map(|t| format_timestamp(&t)),
                key.accession,
                key.version,
                expected.as_str(),
            ],
        )?;
        Ok(affected)
    }

    fn count_assemblies_by_status(&self) -> Result<Vec<(EntryStatus, i64)>, StoreError> {
        let conn = self.lock()?;
        let mut counts = Vec::with_capacity(EntryStatus::ALL.len());
        for status in EntryStatus::ALL {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM assembly_table WHERE status = ?",
                params![status.as_str()],
                |row| row.get(0),
            )?;
            counts.push((status, count));
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ResultFields, ERZ_ACCESSION};
    use chrono::Duration;

    fn create_test_store() -> SqliteSubmissionStore {
        SqliteSubmissionStore::in_memory().unwrap()
    }

    fn submission(accession: &str, status: SubmissionStatus) -> SubmissionRecord {
        let mut sequences = std::collections::BTreeMap::new();
        sequences.insert("main".to_string(), Some("ACGT".to_string()));
        SubmissionRecord {
            key: SequenceKey::new(accession, 1),
            status_all: status,
            group_id: 7,
            organism: "ebola-sudan".to_string(),
            center_name: Some("Test Center".to_string()),
            metadata: serde_json::Map::new(),
            unaligned_nucleotide_sequences: sequences,
            started_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_get_submission() {
        let store = create_test_store();
        let record = submission("LOC_1", SubmissionStatus::SubmittedSample);
        store.insert_submission(&record).unwrap();

        let fetched = store.get_submission(&record.key).unwrap().unwrap();
        assert_eq!(fetched.status_all, SubmissionStatus::SubmittedSample);
        assert_eq!(fetched.center_name.as_deref(), Some("Test Center"));
        assert_eq!(
            fetched.unaligned_nucleotide_sequences.get("main"),
            Some(&Some("ACGT".to_string()))
        );
    }

    #[test]
    fn test_submissions_with_status_filters() {
        let store = create_test_store();
        store
            .insert_submission(&submission("LOC_1", SubmissionStatus::SubmittedSample))
            .unwrap();
        store
            .insert_submission(&submission("LOC_2", SubmissionStatus::SubmittingSample))
            .unwrap();

        let found = store
            .submissions_with_status(SubmissionStatus::SubmittedSample)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key.accession, "LOC_1");
    }

    #[test]
    fn test_update_submission_status_requires_expected_status() {
        let store = create_test_store();
        let record = submission("LOC_1", SubmissionStatus::SubmittedSample);
        store.insert_submission(&record).unwrap();

        let affected = store
            .update_submission_status(
                &record.key,
                SubmissionStatus::SubmittingAssembly,
                SubmissionStatus::SubmittedAll,
            )
            .unwrap();
        assert_eq!(affected, 0);

        let affected = store
            .update_submission_status(
                &record.key,
                SubmissionStatus::SubmittedSample,
                SubmissionStatus::SubmittingAssembly,
            )
            .unwrap();
        assert_eq!(affected, 1);
    }

    #[test]
    fn test_insert_assembly_is_unique_per_key() {
        let store = create_test_store();
        let record = AssemblyRecord::ready(SequenceKey::new("LOC_1", 1), Utc::now());

        assert!(store.insert_assembly(&record).unwrap());
        assert!(!store.insert_assembly(&record).unwrap());
        assert_eq!(
            store.assemblies_with_status(EntryStatus::Ready).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_claim_succeeds_exactly_once() {
        let store = create_test_store();
        let key = SequenceKey::new("LOC_1", 1);
        store
            .insert_assembly(&AssemblyRecord::ready(key.clone(), Utc::now()))
            .unwrap();

        let claim = AssemblyChange::status(EntryStatus::Submitting);
        let first = store.update_assembly(&key, EntryStatus::Ready, &claim).unwrap();
        let second = store.update_assembly(&key, EntryStatus::Ready, &claim).unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 0);
    }

    #[test]
    fn test_update_assembly_keeps_unset_fields() {
        let store = create_test_store();
        let key = SequenceKey::new("LOC_1", 1);
        store
            .insert_assembly(&AssemblyRecord::ready(key.clone(), Utc::now()))
            .unwrap();
        store
            .update_assembly(&key, EntryStatus::Ready, &AssemblyChange::status(EntryStatus::Submitting))
            .unwrap();

        let mut result = ResultFields::new();
        result.insert(ERZ_ACCESSION.to_string(), "ERZ1".to_string());
        store
            .update_assembly(
                &key,
                EntryStatus::Submitting,
                &AssemblyChange::status(EntryStatus::Waiting).with_result(result),
            )
            .unwrap();

        let finished = Utc::now();
        store
            .update_assembly(
                &key,
                EntryStatus::Waiting,
                &AssemblyChange::status(EntryStatus::Submitted).with_finished_at(finished),
            )
            .unwrap();

        let record = store.get_assembly(&key).unwrap().unwrap();
        assert_eq!(record.status, EntryStatus::Submitted);
        assert_eq!(record.external_reference(), Some("ERZ1"));
        assert!(record.finished_at.is_some());
        assert!(record.errors.is_none());
    }

    #[test]
    fn test_assemblies_started_before() {
        let store = create_test_store();
        let now = Utc::now();

        let mut old = AssemblyRecord::ready(SequenceKey::new("OLD", 1), now - Duration::hours(1));
        old.status = EntryStatus::HasErrors;
        store.insert_assembly(&old).unwrap();

        let mut fresh = AssemblyRecord::ready(SequenceKey::new("NEW", 1), now);
        fresh.status = EntryStatus::HasErrors;
        store.insert_assembly(&fresh).unwrap();

        let mut waiting =
            AssemblyRecord::ready(SequenceKey::new("WAIT", 1), now - Duration::hours(1));
        waiting.status = EntryStatus::Waiting;
        store.insert_assembly(&waiting).unwrap();

        let stale = store
            .assemblies_started_before(
                &[EntryStatus::HasErrors, EntryStatus::Submitting],
                now - Duration::minutes(15),
            )
            .unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].key.accession, "OLD");
    }

    #[test]
    fn test_get_sample_and_project() {
        let store = create_test_store();
        let key = SequenceKey::new("LOC_1", 1);
        let mut result = ResultFields::new();
        result.insert("ena_sample_accession".to_string(), "ERS1".to_string());
        store
            .insert_sample(&SampleRecord {
                key: key.clone(),
                status: EntryStatus::Submitted,
                result: Some(result),
            })
            .unwrap();

        let group = GroupKey {
            group_id: 7,
            organism: "ebola-sudan".to_string(),
        };
        store
            .insert_project(&ProjectRecord {
                group_key: group.clone(),
                status: EntryStatus::Submitted,
                result: None,
            })
            .unwrap();

        let sample = store.get_sample(&key).unwrap().unwrap();
        assert_eq!(sample.status, EntryStatus::Submitted);
        assert!(store.get_project(&group).unwrap().unwrap().result.is_none());
        assert!(store.get_sample(&SequenceKey::new("LOC_2", 1)).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_status_is_reported() {
        let store = create_test_store();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO assembly_table (accession, version, status, started_at) VALUES ('BAD', 1, 'BOGUS', ?)",
                params![Utc::now().to_rfc3339()],
            )
            .unwrap();
        }

        let err = store.get_assembly(&SequenceKey::new("BAD", 1)).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_count_assemblies_by_status() {
        let store = create_test_store();
        store
            .insert_assembly(&AssemblyRecord::ready(SequenceKey::new("A", 1), Utc::now()))
            .unwrap();
        store
            .insert_assembly(&AssemblyRecord::ready(SequenceKey::new("B", 1), Utc::now()))
            .unwrap();

        let counts = store.count_assemblies_by_status().unwrap();
        assert!(counts.contains(&(EntryStatus::Ready, 2)));
        assert!(counts.contains(&(EntryStatus::Waiting, 0)));
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("enasub.db");

        let store = SqliteSubmissionStore::new(&db_path).unwrap();
        store
            .insert_assembly(&AssemblyRecord::ready(SequenceKey::new("A", 1), Utc::now()))
            .unwrap();
        assert!(db_path.exists());

        // Reopening sees the same rows.
        drop(store);
        let reopened = SqliteSubmissionStore::new(&db_path).unwrap();
        assert!(reopened.get_assembly(&SequenceKey::new("A", 1)).unwrap().is_some());
    }
}
