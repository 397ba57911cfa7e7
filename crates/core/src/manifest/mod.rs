//! Assembly manifest construction.
//!
//! Turns a submission record plus its sample and project registrations into
//! the payload the registrar consumes: study/sample references, sequencing
//! metadata, a chromosome list and the matching FASTA.

mod builder;
mod config;
mod types;

pub use builder::{ManifestBuilder, ManifestInput};
pub use config::{ManifestConfig, OrganismConfig, OrganismMap};
pub use types::{AssemblyManifest, AssemblyType, ChromosomeEntry, ChromosomeType, MoleculeType};

use thiserror::Error;

/// Errors building a manifest. Both indicate upstream rows that are not in
/// the shape the assembly stage requires.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// A sample or project result lacks its accession.
    #[error("{field} missing for {key}")]
    MissingAccession { field: &'static str, key: String },

    /// No segment of the submission carries a sequence.
    #[error("no sequenced segments for {0}")]
    NoSequences(String),
}
