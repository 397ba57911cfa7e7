//! Mock registrar for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::manifest::AssemblyManifest;
use crate::record::{ResultFields, ERZ_ACCESSION};
use crate::registrar::{Outcome, Registrar};

/// A recorded registrar call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRegistrarCall {
    Create {
        assembly_name: String,
        center_name: Option<String>,
        manifest: AssemblyManifest,
    },
    Check {
        external_reference: String,
    },
}

/// Mock implementation of the Registrar trait.
///
/// Provides controllable behavior for testing:
/// - Queue outcomes for `create` (default: results with a generated reference)
/// - Set the outcome `check` returns per reference (default: pending)
/// - Track calls for assertions
///
/// # Example
///
/// ```rust,ignore
/// use enasub_core::testing::MockRegistrar;
///
/// let registrar = MockRegistrar::new();
/// registrar.queue_create(Outcome::error("duplicate alias")).await;
/// registrar.set_check("ERZ1", Outcome::Pending).await;
/// ```
#[derive(Debug)]
pub struct MockRegistrar {
    /// Outcomes handed out by `create`, in order.
    create_outcomes: Arc<RwLock<VecDeque<Outcome>>>,
    /// Outcome of `check` per external reference.
    check_outcomes: Arc<RwLock<HashMap<String, Outcome>>>,
    /// Recorded calls.
    calls: Arc<RwLock<Vec<RecordedRegistrarCall>>>,
    /// Counter for generating references.
    reference_counter: Arc<RwLock<u32>>,
}

impl Default for MockRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegistrar {
    pub fn new() -> Self {
        Self {
            create_outcomes: Arc::new(RwLock::new(VecDeque::new())),
            check_outcomes: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            reference_counter: Arc::new(RwLock::new(0)),
        }
    }

    /// Queue the outcome of the next `create` call.
    pub async fn queue_create(&self, outcome: Outcome) {
        self.create_outcomes.write().await.push_back(outcome);
    }

    /// Set what `check` returns for `reference`.
    pub async fn set_check(&self, reference: &str, outcome: Outcome) {
        self.check_outcomes
            .write()
            .await
            .insert(reference.to_string(), outcome);
    }

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedRegistrarCall> {
        self.calls.read().await.clone()
    }

    /// Number of `create` calls made.
    pub async fn create_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedRegistrarCall::Create { .. }))
            .count()
    }

    /// Number of `check` calls made.
    pub async fn check_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedRegistrarCall::Check { .. }))
            .count()
    }

    async fn next_reference(&self) -> String {
        let mut counter = self.reference_counter.write().await;
        *counter += 1;
        format!("ERZ{:08}", *counter)
    }
}

#[async_trait]
impl Registrar for MockRegistrar {
    async fn create(&self, manifest: &AssemblyManifest, center_name: Option<&str>) -> Outcome {
        self.calls.write().await.push(RecordedRegistrarCall::Create {
            assembly_name: manifest.assembly_name.clone(),
            center_name: center_name.map(str::to_string),
            manifest: manifest.clone(),
        });

        if let Some(outcome) = self.create_outcomes.write().await.pop_front() {
            return outcome;
        }

        let mut results = ResultFields::new();
        results.insert(ERZ_ACCESSION.to_string(), self.next_reference().await);
        Outcome::Results(results)
    }

    async fn check(&self, external_reference: &str) -> Outcome {
        self.calls.write().await.push(RecordedRegistrarCall::Check {
            external_reference: external_reference.to_string(),
        });

        self.check_outcomes
            .read()
            .await
            .get(external_reference)
            .cloned()
            .unwrap_or(Outcome::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_default_create_generates_reference() {
        let registrar = MockRegistrar::new();
        let manifest = fixtures::manifest("LOC_1.1");

        let Outcome::Results(first) = registrar.create(&manifest, None).await else {
            panic!("expected results");
        };
        let Outcome::Results(second) = registrar.create(&manifest, None).await else {
            panic!("expected results");
        };
        assert_ne!(first[ERZ_ACCESSION], second[ERZ_ACCESSION]);
        assert_eq!(registrar.create_count().await, 2);
    }

    #[tokio::test]
    async fn test_queued_outcomes_and_checks() {
        let registrar = MockRegistrar::new();
        registrar.queue_create(Outcome::error("rejected")).await;
        registrar
            .set_check("ERZ1", Outcome::Results(ResultFields::new()))
            .await;

        let manifest = fixtures::manifest("LOC_1.1");
        assert!(matches!(
            registrar.create(&manifest, Some("Center")).await,
            Outcome::Errors(_)
        ));
        assert!(matches!(registrar.check("ERZ1").await, Outcome::Results(_)));
        assert_eq!(registrar.check("ERZ2").await, Outcome::Pending);
        assert_eq!(registrar.check_count().await, 2);

        let calls = registrar.recorded_calls().await;
        assert!(matches!(
            &calls[0],
            RecordedRegistrarCall::Create { center_name: Some(c), .. } if c == "Center"
        ));
    }
}
