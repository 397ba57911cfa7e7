//! API integration tests against the in-process router.

mod common;

use axum::http::StatusCode;

use common::{fixtures, TestFixture};
use enasub_core::SubmissionStore;

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_status_on_empty_store_lists_every_status() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/status").await;

    assert_eq!(response.status, StatusCode::OK);
    let assemblies = &response.body["assemblies"];
    for status in ["READY", "SUBMITTING", "WAITING", "SUBMITTED", "HAS_ERRORS"] {
        assert_eq!(assemblies[status], 0, "status {}", status);
    }
    assert_eq!(response.body["scheduler"]["running"], false);
    assert_eq!(response.body["scheduler"]["cycles_completed"], 0);
    assert_eq!(response.body["scheduler"]["unrecorded_outcomes"], 0);
}

#[tokio::test]
async fn test_status_reflects_reconcile_progress() {
    let fixture = TestFixture::new();
    let key = fixtures::seed_submitted_sample(&fixture.store, "LOC_1");

    fixture.scheduler.run_cycle().await.unwrap();

    let response = fixture.get("/api/v1/status").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["assemblies"]["WAITING"], 1);
    assert_eq!(response.body["assemblies"]["READY"], 0);
    assert!(fixture.store.get_assembly(&key).unwrap().is_some());
    assert_eq!(fixture.registrar.create_count().await, 1);
}

#[tokio::test]
async fn test_config_hides_registrar_password() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["registrar"]["username"], "Webin-1");
    assert_eq!(response.body["registrar"]["password_configured"], true);
    assert_eq!(response.body["slack_configured"], false);
    assert!(!response.text.contains("registrar-secret"));
}

#[tokio::test]
async fn test_metrics_exposes_assembly_gauges() {
    let fixture = TestFixture::new();
    fixtures::seed_submitted_sample(&fixture.store, "LOC_1");
    fixture.scheduler.run_cycle().await.unwrap();

    let response = fixture.get("/metrics").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("text/plain")));
    assert!(response.text.contains("enasub_assemblies_by_status"));
    assert!(response.text.contains("status=\"WAITING\""));
    assert!(response.text.contains("enasub_scheduler_running"));
}

#[tokio::test]
async fn test_requests_are_counted_by_route() {
    let fixture = TestFixture::new();
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;

    assert!(response.text.contains("enasub_http_requests_total"));
    assert!(response.text.contains("path=\"/api/v1/health\""));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/tickets").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
