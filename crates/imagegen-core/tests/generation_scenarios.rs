//! End-to-end generation scenarios.
//!
//! Drives the orchestrator against a wiremock provider and a SurrealDB
//! (`mem://`) audit store, with virtual time for the polling loop.

use std::sync::Arc;
use std::time::Duration;

use imagegen_core::{
    AuditLog, AuditQuery, AuditStatus, GenerationError, GenerationRequest, Orchestrator,
    PollConfig, ProviderConfig, RequesterIdentity, SteppingClock, SurrealAuditLog,
    WavespeedClient,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Gateway {
    server: MockServer,
    log: Arc<SurrealAuditLog>,
    clock: Arc<SteppingClock>,
    orchestrator: Orchestrator,
}

async fn gateway() -> Gateway {
    let server = MockServer::start().await;
    let client = WavespeedClient::new(ProviderConfig::new("test-key").with_base_url(&server.uri()))
        .unwrap();
    let log = Arc::new(SurrealAuditLog::in_memory().await.unwrap());
    let clock = Arc::new(SteppingClock::new());
    let orchestrator = Orchestrator::new(
        Arc::new(client),
        log.clone(),
        clock.clone(),
        PollConfig::new(60, Duration::from_secs(2)),
    );
    Gateway {
        server,
        log,
        clock,
        orchestrator,
    }
}

fn request(prompt: &str) -> GenerationRequest {
    GenerationRequest::new(RequesterIdentity::new("alice@example.com").unwrap(), prompt)
}

fn prediction(id: &str, status: &str, outputs: &[&str]) -> serde_json::Value {
    json!({
        "code": 200,
        "message": "success",
        "data": { "id": id, "status": status, "outputs": outputs }
    })
}

async fn single_record(log: &SurrealAuditLog) -> imagegen_core::AuditRecord {
    let mut records = log.list_recent(&AuditQuery::default()).await.unwrap();
    assert_eq!(records.len(), 1, "exactly one audit record per invocation");
    records.remove(0)
}

#[tokio::test]
async fn scenario_a_empty_prompt_is_client_error() {
    let gw = gateway().await;

    let err = gw.orchestrator.generate(request("")).await.unwrap_err();

    assert_eq!(err.http_status(), 400);
    assert_eq!(err.to_string(), "Prompt is required");
    assert!(gw.server.received_requests().await.unwrap().is_empty());
    assert_eq!(single_record(&gw.log).await.status, AuditStatus::Failed);
}

#[tokio::test]
async fn scenario_b_immediate_output() {
    let gw = gateway().await;
    Mock::given(method("POST"))
        .and(path("/create"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(prediction("t", "completed", &["http://x/img.png"])),
        )
        .expect(1)
        .mount(&gw.server)
        .await;

    let ok = gw.orchestrator.generate(request("a cat")).await.unwrap();

    assert_eq!(ok.image_url, "http://x/img.png");
    let rec = single_record(&gw.log).await;
    assert_eq!(rec.status, AuditStatus::Success);
    assert_eq!(rec.image_url.as_deref(), Some("http://x/img.png"));
    assert!(rec.generation_time_seconds.unwrap() >= 0.0);
}

#[tokio::test]
async fn scenario_c_processing_until_budget_runs_out() {
    let gw = gateway().await;
    Mock::given(method("POST"))
        .and(path("/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction("task-1", "created", &[])))
        .mount(&gw.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/predictions/task-1/result"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(prediction("task-1", "processing", &[])),
        )
        .expect(60)
        .mount(&gw.server)
        .await;

    let err = gw.orchestrator.generate(request("slow")).await.unwrap_err();

    assert_eq!(err, GenerationError::TimedOut);
    assert_eq!(err.http_status(), 408);
    assert_eq!(err.to_string(), "Image generation timed out");
    assert!(gw.clock.elapsed() >= Duration::from_secs(120));
    assert_eq!(single_record(&gw.log).await.status, AuditStatus::Error);
}

#[tokio::test]
async fn scenario_d_completed_on_third_probe() {
    let gw = gateway().await;
    Mock::given(method("POST"))
        .and(path("/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction("task-2", "created", &[])))
        .mount(&gw.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/predictions/task-2/result"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(prediction("task-2", "processing", &[])),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&gw.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/predictions/task-2/result"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction(
            "task-2",
            "completed",
            &["http://x/img2.png"],
        )))
        .expect(1)
        .mount(&gw.server)
        .await;

    let ok = gw.orchestrator.generate(request("a lighthouse")).await.unwrap();

    assert_eq!(ok.image_url, "http://x/img2.png");
    assert_eq!(gw.clock.elapsed(), Duration::from_secs(6));
    assert!((ok.generation_time_seconds - 6.0).abs() < 1e-9);
}

#[tokio::test]
async fn scenario_e_provider_reports_failure() {
    let gw = gateway().await;
    Mock::given(method("POST"))
        .and(path("/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction("task-3", "created", &[])))
        .mount(&gw.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/predictions/task-3/result"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction("task-3", "failed", &[])))
        .expect(1)
        .mount(&gw.server)
        .await;

    let err = gw.orchestrator.generate(request("p")).await.unwrap_err();

    assert_eq!(err, GenerationError::GenerationFailed);
    let rec = single_record(&gw.log).await;
    assert_eq!(rec.status, AuditStatus::Failed);
    assert_eq!(rec.error_message.as_deref(), Some("Image generation failed"));
}

#[tokio::test]
async fn provider_http_errors_while_polling_are_retried() {
    let gw = gateway().await;
    Mock::given(method("POST"))
        .and(path("/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction("task-4", "created", &[])))
        .mount(&gw.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/predictions/task-4/result"))
        .respond_with(ResponseTemplate::new(500).set_body_string("hiccup"))
        .up_to_n_times(1)
        .mount(&gw.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/predictions/task-4/result"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction(
            "task-4",
            "completed",
            &["http://x/4.png"],
        )))
        .mount(&gw.server)
        .await;

    let ok = gw.orchestrator.generate(request("p")).await.unwrap();
    assert_eq!(ok.image_url, "http://x/4.png");
}

#[tokio::test]
async fn create_failure_passes_status_through_and_is_audited() {
    let gw = gateway().await;
    Mock::given(method("POST"))
        .and(path("/create"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&gw.server)
        .await;

    let err = gw.orchestrator.generate(request("p")).await.unwrap_err();

    assert_eq!(err.http_status(), 401);
    assert_eq!(err.to_string(), "API error: 401 - invalid api key");
    let rec = single_record(&gw.log).await;
    assert_eq!(rec.status, AuditStatus::Error);
    assert!(rec.image_url.is_none());
}

#[tokio::test]
async fn concurrent_invocations_each_write_one_record() {
    let gw = gateway().await;
    Mock::given(method("POST"))
        .and(path("/create"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(prediction("t", "completed", &["http://x/c.png"])),
        )
        .mount(&gw.server)
        .await;

    let runs = (0..8).map(|i| gw.orchestrator.generate(request(&format!("prompt {i}"))));
    let results = futures::future::join_all(runs).await;

    assert!(results.iter().all(|r| r.is_ok()));
    let counts = gw.log.count_by_status().await.unwrap();
    assert_eq!(counts.success, 8);
    assert_eq!(counts.total(), 8);
}
