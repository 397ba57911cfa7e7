//! HTTP registrar client.
//!
//! Manifests are posted as JSON to the submission service; processing state
//! is read back from the reports service's `analysis-process` endpoint.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Outcome, Registrar, RegistrarError};
use crate::manifest::AssemblyManifest;
use crate::metrics::REGISTRAR_REQUEST_DURATION;
use crate::record::{ResultFields, ERZ_ACCESSION};

/// Registrar client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// Submission service base URL.
    pub submission_url: String,
    /// Reports service base URL.
    pub reports_url: String,
    /// Submission account user name.
    #[serde(default)]
    pub username: String,
    /// Submission account password.
    #[serde(default)]
    pub password: String,
    /// Request timeout in seconds (default: 60).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    60
}

/// Body posted to create an assembly.
#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    center_name: Option<&'a str>,
    manifest: &'a AssemblyManifest,
    chromosome_list: String,
}

/// One entry of the `analysis-process` report.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProcessReportEntry {
    pub report: ProcessReport,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProcessReport {
    #[serde(default)]
    pub acc: Option<String>,
    pub processing_status: String,
    #[serde(default)]
    pub processing_error: Option<String>,
}

/// HTTP registrar client.
pub struct HttpRegistrar {
    client: Client,
    submission_url: String,
    reports_url: String,
    username: String,
    password: String,
}

impl HttpRegistrar {
    /// Create a new registrar client.
    pub fn new(config: RegistrarConfig) -> Result<Self, RegistrarError> {
        if config.submission_url.is_empty() || config.reports_url.is_empty() {
            return Err(RegistrarError::NotConfigured(
                "registrar submission_url and reports_url are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            submission_url: config.submission_url.trim_end_matches('/').to_string(),
            reports_url: config.reports_url.trim_end_matches('/').to_string(),
            username: config.username,
            password: config.password,
        })
    }

    async fn try_create(
        &self,
        manifest: &AssemblyManifest,
        center_name: Option<&str>,
    ) -> Result<ResultFields, RegistrarError> {
        let url = format!("{}/assemblies", self.submission_url);

        debug!("Registrar create: assembly_name='{}'", manifest.assembly_name);

        let body = CreateRequest {
            center_name,
            manifest,
            chromosome_list: manifest.chromosome_list_text(),
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistrarError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let fields: HashMap<String, serde_json::Value> = response.json().await.map_err(|e| {
            RegistrarError::ParseError(format!("Failed to parse create response: {}", e))
        })?;

        let results: ResultFields = fields
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_json::Value::String(s) => Some((k, s)),
                serde_json::Value::Number(n) => Some((k, n.to_string())),
                _ => None,
            })
            .collect();

        if !results.contains_key(ERZ_ACCESSION) {
            return Err(RegistrarError::ParseError(format!(
                "create response has no {}",
                ERZ_ACCESSION
            )));
        }
        Ok(results)
    }

    async fn try_check(&self, erz_accession: &str) -> Result<Outcome, RegistrarError> {
        let url = format!("{}/analysis-process/{}", self.reports_url, erz_accession);

        debug!("Registrar check: erz_accession={}", erz_accession);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("format", "json"), ("max-results", "100")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistrarError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let entries: Vec<ProcessReportEntry> = response.json().await.map_err(|e| {
            RegistrarError::ParseError(format!("Failed to parse process report: {}", e))
        })?;

        Ok(interpret_process_report(erz_accession, &entries))
    }
}

/// Map a processing report to an outcome.
///
/// `COMPLETED` with both a genome and a chromosome accession yields results;
/// queued or in-progress reports are pending; anything else is an error.
pub(crate) fn interpret_process_report(
    erz_accession: &str,
    entries: &[ProcessReportEntry],
) -> Outcome {
    let Some(entry) = entries.first() else {
        return Outcome::error(format!("no process report for {}", erz_accession));
    };
    if entries.len() > 1 {
        warn!(
            "Registrar returned {} process reports for {}, using the first",
            entries.len(),
            erz_accession
        );
    }
    let report = &entry.report;

    match report.processing_status.as_str() {
        "COMPLETED" => {
            let accessions = parse_accession_list(report.acc.as_deref().unwrap_or_default());
            let (Some(genome), Some(chromosomes)) =
                (accessions.get("genome"), accessions.get("chromosomes"))
            else {
                return Outcome::error(format!(
                    "completed report for {} lacks genome or chromosome accessions: {:?}",
                    erz_accession, report.acc
                ));
            };

            let mut results = ResultFields::new();
            results.insert(ERZ_ACCESSION.to_string(), erz_accession.to_string());
            results.insert("gca_accession".to_string(), genome.clone());
            results.insert("insdc_accession_range".to_string(), chromosomes.clone());
            Outcome::Results(results)
        }
        "QUEUED" | "PROCESSING" => Outcome::Pending,
        other => Outcome::error(format!(
            "processing status {} for {}: {}",
            other,
            erz_accession,
            report.processing_error.as_deref().unwrap_or("no details")
        )),
    }
}

/// Parse `"chromosomes:OZ1-OZ2,genome:GCA_1.1"` into a kind → accession map.
fn parse_accession_list(acc: &str) -> HashMap<String, String> {
    acc.split(',')
        .filter_map(|part| {
            let (kind, value) = part.trim().split_once(':')?;
            Some((kind.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

#[async_trait]
impl Registrar for HttpRegistrar {
    async fn create(&self, manifest: &AssemblyManifest, center_name: Option<&str>) -> Outcome {
        let start = Instant::now();
        let outcome = match self.try_create(manifest, center_name).await {
            Ok(results) => Outcome::Results(results),
            Err(e) => Outcome::error(e.to_string()),
        };
        REGISTRAR_REQUEST_DURATION
            .with_label_values(&["create"])
            .observe(start.elapsed().as_secs_f64());
        outcome
    }

    async fn check(&self, external_reference: &str) -> Outcome {
        let start = Instant::now();
        let outcome = match self.try_check(external_reference).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::error(e.to_string()),
        };
        REGISTRAR_REQUEST_DURATION
            .with_label_values(&["check"])
            .observe(start.elapsed().as_secs_f64());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: &str, acc: Option<&str>) -> Vec<ProcessReportEntry> {
        vec![ProcessReportEntry {
            report: ProcessReport {
                acc: acc.map(str::to_string),
                processing_status: status.to_string(),
                processing_error: None,
            },
        }]
    }

    #[test]
    fn test_completed_report_yields_accessions() {
        let outcome = interpret_process_report(
            "ERZ24784470",
            &report("COMPLETED", Some("chromosomes:OZ189935-OZ189936,genome:GCA_964187725.1")),
        );
        let Outcome::Results(results) = outcome else {
            panic!("expected results, got {:?}", outcome);
        };
        assert_eq!(results["gca_accession"], "GCA_964187725.1");
        assert_eq!(results["insdc_accession_range"], "OZ189935-OZ189936");
        assert_eq!(results[ERZ_ACCESSION], "ERZ24784470");
    }

    #[test]
    fn test_processing_report_is_pending() {
        assert_eq!(
            interpret_process_report("ERZ1", &report("PROCESSING", None)),
            Outcome::Pending
        );
        assert_eq!(
            interpret_process_report("ERZ1", &report("QUEUED", None)),
            Outcome::Pending
        );
    }

    #[test]
    fn test_failed_report_is_error() {
        let outcome = interpret_process_report("ERZ1", &report("FAILED", None));
        assert!(matches!(outcome, Outcome::Errors(_)));
    }

    #[test]
    fn test_completed_without_genome_is_error() {
        let outcome =
            interpret_process_report("ERZ1", &report("COMPLETED", Some("chromosomes:OZ1-OZ2")));
        assert!(matches!(outcome, Outcome::Errors(_)));
    }

    #[test]
    fn test_empty_report_is_error() {
        assert!(matches!(
            interpret_process_report("ERZ1", &[]),
            Outcome::Errors(_)
        ));
    }

    #[test]
    fn test_report_deserialization() {
        let json = r#"[{"report": {"id": "ERZ1", "analysisType": "SEQUENCE_ASSEMBLY",
            "acc": "genome:GCA_1.1,chromosomes:OZ1", "processingStatus": "COMPLETED",
            "processingStart": "14-06-2024 14:38:03", "processingEnd": "14-06-2024 14:38:14",
            "processingError": null}}]"#;
        let entries: Vec<ProcessReportEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].report.processing_status, "COMPLETED");
        assert!(matches!(
            interpret_process_report("ERZ1", &entries),
            Outcome::Results(_)
        ));
    }

    #[test]
    fn test_new_requires_urls() {
        let result = HttpRegistrar::new(RegistrarConfig {
            submission_url: String::new(),
            reports_url: "https://example.org/report".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            timeout_secs: 5,
        });
        assert!(matches!(result, Err(RegistrarError::NotConfigured(_))));
    }
}
