//! Assembly manifest types.

use serde::{Deserialize, Serialize};

/// Kind of assembly being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyType {
    Clone,
    Isolate,
}

/// Molecule type accepted by the registrar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoleculeType {
    #[serde(rename = "genomic DNA")]
    GenomicDna,
    #[serde(rename = "genomic RNA")]
    GenomicRna,
    #[serde(rename = "viral cRNA")]
    ViralCrna,
}

impl MoleculeType {
    /// Parse the registrar's spelling, e.g. `"genomic RNA"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "genomic DNA" => Some(MoleculeType::GenomicDna),
            "genomic RNA" => Some(MoleculeType::GenomicRna),
            "viral cRNA" => Some(MoleculeType::ViralCrna),
            _ => None,
        }
    }
}

/// Chromosome type column of the chromosome list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChromosomeType {
    Chromosome,
    Plasmid,
    LinkageGroup,
    Monopartite,
    Segmented,
    Multipartite,
}

impl ChromosomeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChromosomeType::Chromosome => "chromosome",
            ChromosomeType::Plasmid => "plasmid",
            ChromosomeType::LinkageGroup => "linkage_group",
            ChromosomeType::Monopartite => "monopartite",
            ChromosomeType::Segmented => "segmented",
            ChromosomeType::Multipartite => "multipartite",
        }
    }
}

/// One line of the chromosome list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromosomeEntry {
    /// Sequence name as it appears in the FASTA header.
    pub object_name: String,
    pub chromosome_name: String,
    pub chromosome_type: ChromosomeType,
}

/// Everything the registrar needs to create one assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyManifest {
    /// Study (project) accession.
    pub study: String,
    /// Sample accession.
    pub sample: String,
    /// Alias of the assembly; must be unique per submitting account.
    pub assembly_name: String,
    pub assembly_type: AssemblyType,
    pub coverage: serde_json::Number,
    pub program: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub molecule_type: Option<MoleculeType>,
    pub description: String,
    pub chromosome_list: Vec<ChromosomeEntry>,
    /// FASTA text, one record per chromosome list entry.
    pub fasta: String,
}

impl AssemblyManifest {
    /// Chromosome list in the registrar's tab-separated format.
    pub fn chromosome_list_text(&self) -> String {
        self.chromosome_list
            .iter()
            .map(|entry| {
                format!(
                    "{}\t{}\t{}\n",
                    entry.object_name,
                    entry.chromosome_name,
                    entry.chromosome_type.as_str()
                )
            })
            .collect()
    }
}
