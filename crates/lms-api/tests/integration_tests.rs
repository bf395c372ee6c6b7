//! # Integration Tests for lms-api
//!
//! Drives the assembled router with `tower::ServiceExt::oneshot`: health
//! probes, certificate issuance and validation, course authoring and
//! listing under the auth middleware, the catalogue, and the OpenAPI
//! document.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use zeroize::Zeroizing;

use lms_api::state::{AppConfig, AppState};
use lms_core::{FixedClock, Timestamp};
use lms_store::MemoryStore;

const TOKEN: &str = "s3cret";

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Timestamp::parse("2026-01-15T12:00:00.000Z").unwrap(),
    ))
}

/// Helper: auth disabled, fresh in-memory store, clock pinned to 2026-01-15.
fn test_app() -> axum::Router {
    let store = Arc::new(MemoryStore::with_default_schema());
    lms_api::app(AppState::with_store(store, clock(), AppConfig::default()))
}

/// Helper: auth enabled with [`TOKEN`].
fn test_app_with_auth() -> axum::Router {
    let config = AppConfig {
        port: 8080,
        auth_token: Some(Zeroizing::new(TOKEN.to_string())),
    };
    let store = Arc::new(MemoryStore::with_default_schema());
    lms_api::app(AppState::with_store(store, clock(), config))
}

fn offline_app() -> axum::Router {
    let store = Arc::new(MemoryStore::with_default_schema());
    store.set_offline(true);
    lms_api::app(AppState::with_store(store, clock(), AppConfig::default()))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    request
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn certificate(date: &str) -> Value {
    json!({
        "student_name": "Ada Lovelace",
        "course_name": "Python Course LM6E",
        "certificate_type": "Completion",
        "date_awarded": date,
    })
}

fn course() -> Value {
    json!({
        "name": "Intro to Python",
        "subject": "python",
        "topic": "Basics",
        "duration": 90,
    })
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = test_app().oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_reports_backend() {
    let response = test_app().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn test_health_bypasses_auth() {
    let request = with_bearer(get("/health/liveness"), "wrong");
    let response = test_app_with_auth().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Certificate Issuance -----------------------------------------------------

#[tokio::test]
async fn test_issue_certificate_returns_201_with_key() {
    let response = test_app()
        .oneshot(post_json("/v1/certificates", certificate("2026-01-14")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let key = body["certificate_key"].as_str().unwrap();
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    assert_eq!(body["student_name"], "Ada Lovelace");
    assert_eq!(body["date_awarded"], "2026-01-14");
    assert_eq!(body["created_at"], "2026-01-15T12:00:00.000Z");
}

#[tokio::test]
async fn test_issue_accepts_camel_case_fields() {
    let body = json!({
        "studentName": "Ada Lovelace",
        "courseName": "Python Course LM6E",
        "certificateType": "Completion",
        "dateAwarded": "2026-01-15",
    });
    let response = test_app()
        .oneshot(post_json("/v1/certificates", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_duplicate_certificate_returns_409() {
    let app = test_app();
    let first = app
        .clone()
        .oneshot(post_json("/v1/certificates", certificate("2026-01-14")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let mut padded = certificate("2026-01-14");
    padded["student_name"] = json!("  Ada Lovelace ");
    let second = app
        .oneshot(post_json("/v1/certificates", padded))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = body_json(second).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(
        body["error"]["message"],
        "A certificate with these details already exists"
    );
}

#[tokio::test]
async fn test_future_date_returns_422_with_field() {
    let response = test_app()
        .oneshot(post_json("/v1/certificates", certificate("2026-01-16")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"]["field"], "date_awarded");
}

#[tokio::test]
async fn test_blank_student_name_returns_422() {
    let mut body = certificate("2026-01-14");
    body["student_name"] = json!("   ");
    let response = test_app()
        .oneshot(post_json("/v1/certificates", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["details"]["field"], "student_name");
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/certificates")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_offline_store_returns_redacted_503() {
    let response = offline_app()
        .oneshot(post_json("/v1/certificates", certificate("2026-01-14")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(!message.contains("memory"));
    assert!(!message.contains("certificates"));
}

// -- Certificate Validation ---------------------------------------------------

#[tokio::test]
async fn test_validate_issued_key_is_valid() {
    let app = test_app();
    let issued = app
        .clone()
        .oneshot(post_json("/v1/certificates", certificate("2026-01-14")))
        .await
        .unwrap();
    let key = body_json(issued).await["certificate_key"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/certificates/validate",
            json!({ "certificate_key": format!("  {key}  ") }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["certificate"]["certificate_key"], key.as_str());
    assert_eq!(body["certificate"]["course_name"], "Python Course LM6E");

    let fetched = app
        .oneshot(get(&format!("/v1/certificates/{key}")))
        .await
        .unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(body_json(fetched).await["student_name"], "Ada Lovelace");
}

#[tokio::test]
async fn test_validate_unknown_key_is_not_valid() {
    let response = test_app()
        .oneshot(post_json(
            "/v1/certificates/validate",
            json!({ "certificate_key": "0".repeat(64) }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["valid"], false);
    assert!(body["certificate"].is_null());
}

#[tokio::test]
async fn test_validate_blank_key_returns_422() {
    let response = test_app()
        .oneshot(post_json(
            "/v1/certificates/validate",
            json!({ "certificate_key": "   " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Please enter a certificate key");
}

#[tokio::test]
async fn test_get_unknown_key_returns_404() {
    let response = test_app()
        .oneshot(get("/v1/certificates/not-a-key"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validate_offline_returns_503_not_invalid() {
    let response = offline_app()
        .oneshot(post_json(
            "/v1/certificates/validate",
            json!({ "certificate_key": "a".repeat(64) }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn test_public_routes_need_no_credentials_with_auth_enabled() {
    let response = test_app_with_auth()
        .oneshot(post_json("/v1/certificates", certificate("2026-01-14")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_invalid_token_is_rejected_even_on_public_routes() {
    let request = with_bearer(get("/v1/catalog"), "student:u1:wrong");
    let response = test_app_with_auth().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_course_without_credentials_returns_401() {
    let response = test_app_with_auth()
        .oneshot(post_json("/v1/courses", course()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "User not authenticated");
}

#[tokio::test]
async fn test_create_course_as_student_returns_403() {
    let request = with_bearer(post_json("/v1/courses", course()), &format!("student:u1:{TOKEN}"));
    let response = test_app_with_auth().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_course_with_legacy_token_has_no_author() {
    let request = with_bearer(post_json("/v1/courses", course()), TOKEN);
    let response = test_app_with_auth().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// -- Courses ------------------------------------------------------------------

#[tokio::test]
async fn test_instructor_creates_and_lists_courses() {
    let app = test_app_with_auth();
    let request = with_bearer(
        post_json("/v1/courses", course()),
        &format!("instructor:teach-1:{TOKEN}"),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["author"], "teach-1");
    assert_eq!(created["subject"], "python");
    assert_eq!(created["subject_name"], "Python");
    assert_eq!(created["duration"], 90);

    let listing = app
        .oneshot(get("/v1/courses?subject=python&limit=5"))
        .await
        .unwrap();
    assert_eq!(listing.status(), StatusCode::OK);
    let body = body_json(listing).await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 5);
    assert_eq!(body["courses"].as_array().unwrap().len(), 1);
    assert_eq!(body["courses"][0]["id"], created["id"]);
}

#[tokio::test]
async fn test_auth_disabled_creates_course_as_local_dev() {
    let response = test_app()
        .oneshot(post_json("/v1/courses", course()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["author"], "local-dev");
}

#[tokio::test]
async fn test_course_duration_out_of_range_returns_422() {
    let mut body = course();
    body["duration"] = json!(1441);
    let response = test_app()
        .oneshot(post_json("/v1/courses", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["details"]["field"], "duration");
}

#[tokio::test]
async fn test_list_courses_unknown_subject_returns_422() {
    let response = test_app()
        .oneshot(get("/v1/courses?subject=astrology"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_list_courses_empty() {
    let response = test_app().oneshot(get("/v1/courses")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["courses"].as_array().unwrap().is_empty());
    assert_eq!(body["limit"], 10);
}

// -- Catalogue and OpenAPI ----------------------------------------------------

#[tokio::test]
async fn test_catalog_lists_pickers() {
    let response = test_app().oneshot(get("/v1/catalog")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let courses = body["courses"].as_array().unwrap();
    assert!(courses.iter().any(|c| c == "CodeCadet Event"));
    assert_eq!(body["certificate_types"][0], "Completion");
    assert!(body["subjects"]
        .as_array()
        .unwrap()
        .iter()
        .any(|s| s["id"] == "python"));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let response = test_app().oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["openapi"].as_str().unwrap().starts_with("3."));
    assert!(body["paths"]["/v1/certificates"].is_object());
    assert!(body["paths"]["/v1/courses"].is_object());
}
