//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the registrar and notifier
//! traits plus a failure-injecting store wrapper, so the reconciler can be
//! exercised end to end without a real archive.
//!
//! # Example
//!
//! ```rust,ignore
//! use enasub_core::testing::{fixtures, MockRegistrar, MockNotifier};
//!
//! let store = Arc::new(SqliteSubmissionStore::in_memory()?);
//! let key = fixtures::seed_submitted_sample(&store, "LOC_1");
//! let registrar = Arc::new(MockRegistrar::new());
//! ```

mod flaky_store;
mod mock_notifier;
mod mock_registrar;

pub use flaky_store::FlakyStore;
pub use mock_notifier::{MockNotifier, RecordedNotification};
pub use mock_registrar::{MockRegistrar, RecordedRegistrarCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use serde_json::json;

    use crate::manifest::{
        AssemblyManifest, AssemblyType, ChromosomeEntry, ChromosomeType, ManifestBuilder,
        ManifestConfig, OrganismConfig,
    };
    use crate::record::{
        EntryStatus, GroupKey, ProjectRecord, ResultFields, SampleRecord, SequenceKey,
        SqliteSubmissionStore, SubmissionRecord, SubmissionStatus, PROJECT_ACCESSION,
        SAMPLE_ACCESSION,
    };

    /// Organism used by the fixtures; single segment.
    pub const ORGANISM: &str = "ebola-sudan";

    /// Group used by the fixtures.
    pub const GROUP_ID: i64 = 7;

    /// Build a result map from pairs.
    pub fn fields(pairs: &[(&str, &str)]) -> ResultFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// A single-segment primary record with typical metadata.
    pub fn submission(accession: &str, status: SubmissionStatus) -> SubmissionRecord {
        let metadata = json!({
            "authors": "Doe, J.",
            "sequencingInstrument": "Illumina NovaSeq 6000",
            "sequencingProtocol": "amplicon",
            "depthOfCoverage": 42,
        });
        let metadata = match metadata {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };

        let mut sequences = BTreeMap::new();
        sequences.insert("main".to_string(), Some("ACGTACGTAC".to_string()));

        SubmissionRecord {
            key: SequenceKey::new(accession, 1),
            status_all: status,
            group_id: GROUP_ID,
            organism: ORGANISM.to_string(),
            center_name: Some("Test Center".to_string()),
            metadata,
            unaligned_nucleotide_sequences: sequences,
            started_at: Utc::now(),
        }
    }

    /// A completed sample registration.
    pub fn sample(key: &SequenceKey) -> SampleRecord {
        SampleRecord {
            key: key.clone(),
            status: EntryStatus::Submitted,
            result: Some(fields(&[(
                SAMPLE_ACCESSION,
                &format!("ERS_{}", key.accession),
            )])),
        }
    }

    /// The completed project registration shared by all fixture submissions.
    pub fn project() -> ProjectRecord {
        ProjectRecord {
            group_key: GroupKey {
                group_id: GROUP_ID,
                organism: ORGANISM.to_string(),
            },
            status: EntryStatus::Submitted,
            result: Some(fields(&[(PROJECT_ACCESSION, "PRJEB00007")])),
        }
    }

    /// A primary record whose only segment was not sequenced.
    pub fn unsequenced(accession: &str, status: SubmissionStatus) -> SubmissionRecord {
        let mut record = submission(accession, status);
        record
            .unaligned_nucleotide_sequences
            .insert("main".to_string(), None);
        record
    }

    /// Seed a primary record in `SUBMITTED_SAMPLE` with its sample and the
    /// shared project (inserted once).
    pub fn seed_submitted_sample(store: &SqliteSubmissionStore, accession: &str) -> SequenceKey {
        seed(
            store,
            submission(accession, SubmissionStatus::SubmittedSample),
        )
    }

    /// Seed `record` with its sample and the shared project (inserted once).
    pub fn seed(store: &SqliteSubmissionStore, record: SubmissionRecord) -> SequenceKey {
        use crate::record::SubmissionStore;

        let key = record.key.clone();
        store
            .insert_submission(&record)
            .expect("insert submission fixture");
        store
            .insert_sample(&sample(&key))
            .expect("insert sample fixture");
        let project = project();
        if store
            .get_project(&project.group_key)
            .expect("read project fixture")
            .is_none()
        {
            store
                .insert_project(&project)
                .expect("insert project fixture");
        }
        key
    }

    /// Builder configured for the fixture organism.
    pub fn manifest_builder() -> ManifestBuilder {
        let mut organisms = BTreeMap::new();
        organisms.insert(
            ORGANISM.to_string(),
            OrganismConfig {
                molecule_type: Some("genomic RNA".to_string()),
            },
        );
        ManifestBuilder::new(ManifestConfig::default(), organisms)
    }

    /// A minimal manifest for registrar tests.
    pub fn manifest(assembly_name: &str) -> AssemblyManifest {
        AssemblyManifest {
            study: "PRJEB00007".to_string(),
            sample: "ERS000001".to_string(),
            assembly_name: assembly_name.to_string(),
            assembly_type: AssemblyType::Isolate,
            coverage: serde_json::Number::from(1),
            program: "Unknown".to_string(),
            platform: "Unknown".to_string(),
            molecule_type: None,
            description: "Original sequence submitted to Loculus".to_string(),
            chromosome_list: vec![ChromosomeEntry {
                object_name: assembly_name.to_string(),
                chromosome_name: "main".to_string(),
                chromosome_type: ChromosomeType::Segmented,
            }],
            fasta: format!(">{}\nACGT\n", assembly_name),
        }
    }
}
