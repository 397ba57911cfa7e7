//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process,
//! backed by an in-memory record store, a mock registrar and a mock notifier.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use enasub_core::{
    load_config_from_str,
    reconciler::EscalationConfig,
    testing::{MockNotifier, MockRegistrar},
    AssemblyMachine, EscalationMonitor, ReconcileScheduler, RetryPolicy, SqliteSubmissionStore,
    SubmissionMachine,
};
use enasub_server::state::AppState;

/// Re-export fixtures for test convenience
pub use enasub_core::testing::fixtures;

/// Configuration served by `/api/v1/config` in tests.
pub const TEST_CONFIG: &str = r#"
[registrar]
submission_url = "https://submit.example.org"
reports_url = "https://reports.example.org"
username = "Webin-1"
password = "registrar-secret"

[server]
host = "127.0.0.1"
port = 8080
"#;

/// Test fixture with controllable mocks behind the real router.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Record store shared with the scheduler
    pub store: Arc<SqliteSubmissionStore>,
    /// Mock registrar - queue create and check outcomes
    pub registrar: Arc<MockRegistrar>,
    /// Mock notifier - inspect alerts
    pub notifier: Arc<MockNotifier>,
    /// Scheduler behind `/api/v1/status`
    pub scheduler: Arc<ReconcileScheduler>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub text: String,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        let config = load_config_from_str(TEST_CONFIG).expect("Failed to parse test config");
        let store =
            Arc::new(SqliteSubmissionStore::in_memory().expect("Failed to create store"));
        let registrar = Arc::new(MockRegistrar::new());
        let notifier = Arc::new(MockNotifier::new());

        let scheduler = Arc::new(ReconcileScheduler::new(
            SubmissionMachine::new(store.clone()),
            AssemblyMachine::new(
                store.clone(),
                registrar.clone(),
                fixtures::manifest_builder(),
                RetryPolicy::default(),
                chrono::Duration::minutes(5),
            ),
            EscalationMonitor::new(store.clone(), notifier.clone(), EscalationConfig::default()),
            Duration::from_millis(10),
        ));

        let state = Arc::new(AppState::new(config, store.clone(), scheduler.clone()));
        let router = enasub_server::api::create_router(state);

        Self {
            router,
            store,
            registrar,
            notifier,
            scheduler,
        }
    }

    /// Send a GET request to the test router.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            content_type,
            text,
            body,
        }
    }
}
