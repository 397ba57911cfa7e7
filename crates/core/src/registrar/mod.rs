//! External registrar integration.
//!
//! The registrar is the archive that accepts assemblies and eventually assigns
//! permanent accessions. Two calls are needed: `create` submits a manifest and
//! returns a reference, `check` polls that reference until accessions exist.

mod http;
mod types;

pub use http::{HttpRegistrar, RegistrarConfig};
pub use types::Outcome;

use async_trait::async_trait;
use thiserror::Error;

use crate::manifest::AssemblyManifest;

/// Errors talking to the registrar over the wire.
///
/// These never escape a [`Registrar`] call; implementations fold them into
/// [`Outcome::Errors`].
#[derive(Debug, Error)]
pub enum RegistrarError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Registrar answered with a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing URL or credentials).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Client for the registrar.
///
/// Both calls are single-attempt. `create` is **not idempotent**: calling it
/// twice for the same manifest creates two external entities, so callers must
/// never retry it.
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Submit a new assembly.
    async fn create(&self, manifest: &AssemblyManifest, center_name: Option<&str>) -> Outcome;

    /// Ask whether a previously created assembly has been accessioned.
    async fn check(&self, external_reference: &str) -> Outcome;
}
