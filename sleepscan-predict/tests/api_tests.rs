//! Integration tests for sleepscan-predict API endpoints
//!
//! Tests cover:
//! - POST /predict success payload (web client key names)
//! - Input errors as 422 with code and column
//! - Engine failures as 500
//! - Missing form field (400) and oversized upload (413)
//! - Health, build info and model info endpoints
//! - CORS for the configured browser origin

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::Value;
use sleepscan_predict::engine::{EngineError, InferenceEngine, NamedTensor, StaticEngine, Tensor};
use sleepscan_predict::{build_router, Adapter, AppState};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

const FIXTURE: &[u8] = include_bytes!("fixtures/night_valid.csv");

const BOUNDARY: &str = "sleepscan-test-boundary";

const ORIGIN: &str = "http://localhost:3000";

struct FailingEngine;

impl InferenceEngine for FailingEngine {
    fn name(&self) -> &str {
        "failing"
    }

    fn run(&self, _inputs: &[NamedTensor]) -> Result<Vec<Tensor>, EngineError> {
        Err(EngineError::Inference("session aborted".to_string()))
    }
}

/// Test helper: Create app around an engine with default limits
fn setup_app(engine: Arc<dyn InferenceEngine>) -> axum::Router {
    setup_app_with_limit(engine, 1024 * 1024)
}

fn setup_app_with_limit(engine: Arc<dyn InferenceEngine>, max_upload_bytes: usize) -> axum::Router {
    let state = AppState::new(
        Adapter::new(engine),
        vec![ORIGIN.to_string()],
        max_upload_bytes,
    );
    build_router(state)
}

fn stub_app(probability: f32) -> axum::Router {
    setup_app(Arc::new(StaticEngine::new(probability)))
}

/// Test helper: multipart/form-data body with one file field
fn multipart_body(field_name: &str, contents: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"night.csv\"\r\n",
            field_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Test helper: POST /predict with the given field
fn predict_request(field_name: &str, contents: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field_name, contents)))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Prediction Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_predict_returns_features_and_label() {
    let app = stub_app(0.73);

    let response = app.oneshot(predict_request("file", FIXTURE)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["Age"], 67.0);
    assert_eq!(body["REM Sleep Percentage"], 18.5);
    assert_eq!(body["Deep Sleep Percentage"], 12.3);
    assert_eq!(body["Exercise Frequency"], 2.0);
    assert_eq!(body["Prediction"], "Parkinson");

    let likelihood = body["Parkinsons_Likelihood"].as_f64().unwrap();
    assert!((likelihood - 0.73).abs() < 1e-6);

    let series = body["Movement Time Series"].as_array().unwrap();
    assert_eq!(series.len(), 24);
    assert!((series[0].as_f64().unwrap() - 0.12).abs() < 1e-6);
    assert!((series[23].as_f64().unwrap() - 0.14).abs() < 1e-6);
}

#[tokio::test]
async fn test_predict_low_probability_is_no_parkinson() {
    let app = stub_app(0.1);

    let response = app.oneshot(predict_request("file", FIXTURE)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["Prediction"], "No Parkinson");
}

#[tokio::test]
async fn test_predict_non_numeric_field_is_422_with_column() {
    let engine = Arc::new(StaticEngine::new(0.73));
    let app = setup_app(engine.clone());
    let csv = String::from_utf8(FIXTURE.to_vec())
        .unwrap()
        .replacen("P-0042,67,18.5,", "P-0042,67,unknown,", 1);

    let response = app
        .oneshot(predict_request("file", csv.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "FIELD_TYPE_ERROR");
    assert_eq!(body["error"]["column"], 2);
    assert!(body["error"]["message"].as_str().unwrap().contains("unknown"));
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_predict_short_file_is_422() {
    let app = stub_app(0.73);
    let csv: String = String::from_utf8(FIXTURE.to_vec())
        .unwrap()
        .lines()
        .take(11)
        .map(|line| format!("{}\n", line))
        .collect();

    let response = app
        .oneshot(predict_request("file", csv.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "INSUFFICIENT_ROWS");
    assert!(body["error"].get("column").is_none());
}

#[tokio::test]
async fn test_predict_engine_failure_is_500() {
    let app = setup_app(Arc::new(FailingEngine));

    let response = app.oneshot(predict_request("file", FIXTURE)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "ENGINE_ERROR");
}

#[tokio::test]
async fn test_predict_wrong_field_name_is_400() {
    let engine = Arc::new(StaticEngine::new(0.73));
    let app = setup_app(engine.clone());

    let response = app.oneshot(predict_request("upload", FIXTURE)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_predict_oversized_upload_is_413() {
    let app = setup_app_with_limit(Arc::new(StaticEngine::new(0.73)), 128);

    let response = app.oneshot(predict_request("file", FIXTURE)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// =============================================================================
// Info Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = stub_app(0.5);

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "sleepscan-predict");
    assert_eq!(body["engine"], "static");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let app = stub_app(0.5);

    let response = app.oneshot(get_request("/api/buildinfo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["git_hash"].is_string());
    assert!(body["build_timestamp"].is_string());
    assert!(body["build_profile"].is_string());
}

#[tokio::test]
async fn test_model_endpoint_reports_bindings() {
    let app = stub_app(0.5);

    let response = app.oneshot(get_request("/api/model")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["backend"], "static");
    assert_eq!(body["profile_input"]["name"], "profile_input");
    assert_eq!(body["profile_input"]["shape"], serde_json::json!([1, 4]));
    assert_eq!(body["movement_input"]["name"], "movement_input");
    assert_eq!(body["movement_input"]["shape"], serde_json::json!([1, 24, 1]));
    assert_eq!(body["movement_column"], "movement");
    assert_eq!(body["profile_columns"].as_array().unwrap().len(), 4);
}

// =============================================================================
// CORS Tests
// =============================================================================

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let app = stub_app(0.73);
    let mut request = predict_request("file", FIXTURE);
    request
        .headers_mut()
        .insert(header::ORIGIN, ORIGIN.parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_cors_preflight_for_predict() {
    let app = stub_app(0.73);
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/predict")
        .header(header::ORIGIN, ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        ORIGIN
    );
}

#[tokio::test]
async fn test_cors_rejects_other_origin() {
    let app = stub_app(0.73);
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .header(header::ORIGIN, "http://evil.example")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
