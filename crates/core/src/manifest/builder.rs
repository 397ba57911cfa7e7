//! Builds assembly manifests from submission, sample and project records.

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};

use super::config::{ManifestConfig, OrganismMap};
use super::types::{AssemblyManifest, AssemblyType, ChromosomeEntry, ChromosomeType, MoleculeType};
use super::ManifestError;
use crate::record::{
    ProjectRecord, SampleRecord, SequenceKey, SubmissionRecord, PROJECT_ACCESSION,
    SAMPLE_ACCESSION,
};

/// Records a manifest is built from.
#[derive(Debug, Clone, Copy)]
pub struct ManifestInput<'a> {
    pub submission: &'a SubmissionRecord,
    pub sample: &'a SampleRecord,
    pub project: &'a ProjectRecord,
}

/// Pure manifest builder.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    config: ManifestConfig,
    organisms: OrganismMap,
}

impl ManifestBuilder {
    pub fn new(config: ManifestConfig, organisms: OrganismMap) -> Self {
        Self { config, organisms }
    }

    /// Build the manifest for one submission. `now` only affects the
    /// assembly name in test mode.
    pub fn build(
        &self,
        input: ManifestInput<'_>,
        now: DateTime<Utc>,
    ) -> Result<AssemblyManifest, ManifestError> {
        let key = &input.submission.key;

        let sample = input
            .sample
            .result
            .as_ref()
            .and_then(|r| r.get(SAMPLE_ACCESSION))
            .ok_or_else(|| ManifestError::MissingAccession {
                field: SAMPLE_ACCESSION,
                key: key.to_string(),
            })?
            .clone();

        let study = input
            .project
            .result
            .as_ref()
            .and_then(|r| r.get(PROJECT_ACCESSION))
            .ok_or_else(|| ManifestError::MissingAccession {
                field: PROJECT_ACCESSION,
                key: key.to_string(),
            })?
            .clone();

        let (chromosome_list, fasta) =
            chromosomes(key, &input.submission.unaligned_nucleotide_sequences)?;

        let metadata = &input.submission.metadata;
        let program = metadata_text(metadata, "sequencingInstrument")
            .unwrap_or_else(|| "Unknown".to_string());
        let platform = metadata_text(metadata, "sequencingProtocol")
            .unwrap_or_else(|| "Unknown".to_string());

        let assembly_name = if self.config.test_mode {
            format!(
                "{}{}",
                key.accession,
                now.format("%Y-%m-%d_%H_%M_%S%.6f_00_00")
            )
        } else {
            key.accession.clone()
        };

        Ok(AssemblyManifest {
            study,
            sample,
            assembly_name,
            assembly_type: AssemblyType::Isolate,
            coverage: coverage(metadata),
            program,
            platform,
            molecule_type: self.molecule_type(&input.submission.organism, metadata),
            description: format!(
                "Original sequence submitted to {} with accession: {}, version: {}",
                self.config.db_name, key.accession, key.version
            ),
            chromosome_list,
            fasta,
        })
    }

    /// Only organisms with a configured molecule type get one. The
    /// submission's own value wins over that default; unrecognized values are
    /// dropped.
    fn molecule_type(
        &self,
        organism: &str,
        metadata: &serde_json::Map<String, Value>,
    ) -> Option<MoleculeType> {
        let organism_default = self.organisms.get(organism)?.molecule_type.as_deref()?;
        metadata_text(metadata, "moleculeType")
            .and_then(|m| MoleculeType::parse(&m))
            .or_else(|| MoleculeType::parse(organism_default))
    }
}

fn metadata_text(metadata: &serde_json::Map<String, Value>, field: &str) -> Option<String> {
    match metadata.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Depth of coverage as an integer when whole, falling back to 1 when absent
/// or unparsable.
fn coverage(metadata: &serde_json::Map<String, Value>) -> Number {
    let parsed = metadata_text(metadata, "depthOfCoverage")
        .and_then(|text| text.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite());

    match parsed {
        Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Number::from(v as i64),
        Some(v) => Number::from_f64(v).unwrap_or_else(|| Number::from(1)),
        None => Number::from(1),
    }
}

/// Chromosome list and FASTA for the sequenced segments.
///
/// A single-segment organism yields one `main` chromosome named after the
/// key; multi-segment organisms list each sequenced segment.
fn chromosomes(
    key: &SequenceKey,
    sequences: &std::collections::BTreeMap<String, Option<String>>,
) -> Result<(Vec<ChromosomeEntry>, String), ManifestError> {
    let mut entries = Vec::new();
    let mut fasta = String::new();

    if sequences.len() > 1 {
        for (segment, sequence) in sequences {
            let Some(sequence) = sequence.as_deref().filter(|s| !s.is_empty()) else {
                continue;
            };
            let object_name = format!("{}.{}_{}", key.accession, key.version, segment);
            fasta.push_str(&format!(">{}\n{}\n", object_name, sequence));
            entries.push(ChromosomeEntry {
                object_name,
                chromosome_name: segment.clone(),
                chromosome_type: ChromosomeType::Segmented,
            });
        }
    } else if let Some(sequence) = sequences
        .values()
        .next()
        .and_then(|s| s.as_deref())
        .filter(|s| !s.is_empty())
    {
        let object_name = key.to_string();
        fasta.push_str(&format!(">{}\n{}\n", object_name, sequence));
        entries.push(ChromosomeEntry {
            object_name,
            chromosome_name: "main".to_string(),
            chromosome_type: ChromosomeType::Segmented,
        });
    }

    if entries.is_empty() {
        return Err(ManifestError::NoSequences(key.to_string()));
    }
    Ok((entries, fasta))
}
