//! # Integration Tests for certledger-api
//!
//! Exercises the HTTP surface end to end over in-memory stores:
//! subject registration, enrollment, issuance, verification,
//! revocation, lookup, institutions, and the error envelope mapping.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use certledger_anchor::InProcessLedger;
use certledger_api::{app, AppState};
use certledger_archive::MemoryArchive;
use certledger_issuance::{IssuanceOrchestrator, TextRenderer, VerificationService};
use certledger_registry::MemoryRegistry;

/// Helper: build the test app over fresh in-memory stores.
fn test_app() -> axum::Router {
    let registry = Arc::new(MemoryRegistry::new());
    let ledger = Arc::new(InProcessLedger::new());
    let archive = Arc::new(MemoryArchive::new());
    let renderer = Arc::new(TextRenderer::new("https://verify.example.org"));

    let orchestrator = Arc::new(
        IssuanceOrchestrator::new(registry.clone(), ledger.clone(), archive.clone(), renderer)
            .with_reconcile_grace(Duration::ZERO),
    );
    let verifier = Arc::new(VerificationService::new(
        registry.clone(),
        ledger.clone(),
        archive.clone(),
    ));
    app(AppState::new(orchestrator, verifier, registry))
}

/// Helper: POST a JSON body.
fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Helper: read a response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Helper: register S1 and enroll it in Course-X.
async fn seed(app: &axum::Router) {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/subjects",
            serde_json::json!({
                "subject_id": "S1",
                "name": "Aarav Sharma",
                "contact": "aarav@example.com"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/enroll",
            serde_json::json!({"subject_id": "S1", "course_name": "Course-X"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

/// Helper: issue for S1/Course-X and return the credential id.
async fn issue(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/issue",
            serde_json::json!({"subject_id": "S1", "course_name": "Course-X"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert!(body["content_link"].as_str().unwrap().starts_with("memory://"));
    body["credential_id"].as_str().unwrap().to_string()
}

// -- Health probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_probe() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/readiness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Issue / verify / revoke over HTTP ----------------------------------------

#[tokio::test]
async fn test_issue_verify_revoke_flow() {
    let app = test_app();
    seed(&app).await;
    let credential_id = issue(&app).await;

    // Verify: valid with subject, course, and content link.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/verify",
            serde_json::json!({"credential_id": credential_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["valid"], serde_json::json!(true));
    assert_eq!(body["subject_name"], serde_json::json!("Aarav Sharma"));
    assert_eq!(body["course"], serde_json::json!("Course-X"));

    // Revoke, then verify again: invalid/revoked.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/revoke",
            serde_json::json!({"credential_id": credential_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["revoked"], serde_json::json!(true));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/verify",
            serde_json::json!({"credential_id": credential_id}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["valid"], serde_json::json!(false));
    assert_eq!(body["reason"], serde_json::json!("revoked"));
}

#[tokio::test]
async fn test_second_issue_conflicts() {
    let app = test_app();
    seed(&app).await;
    issue(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/issue",
            serde_json::json!({"subject_id": "S1", "course_name": "Course-X"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], serde_json::json!("CONFLICT"));
}

#[tokio::test]
async fn test_verify_unknown_credential_is_404() {
    let app = test_app();
    let response = app
        .oneshot(post_json(
            "/api/verify",
            serde_json::json!({"credential_id": "00000000-0000-0000-0000-000000000000"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], serde_json::json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_malformed_credential_id_is_422() {
    let app = test_app();
    let response = app
        .oneshot(post_json(
            "/api/verify",
            serde_json::json!({"credential_id": "not-a-uuid"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], serde_json::json!("VALIDATION_ERROR"));
}

// -- Subjects and enrollment --------------------------------------------------

#[tokio::test]
async fn test_duplicate_enrollment_conflicts() {
    let app = test_app();
    seed(&app).await;

    let response = app
        .oneshot(post_json(
            "/api/enroll",
            serde_json::json!({"subject_id": "S1", "course_name": "Course-X"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_enroll_unknown_subject_is_404() {
    let app = test_app();
    let response = app
        .oneshot(post_json(
            "/api/enroll",
            serde_json::json!({"subject_id": "ghost", "course_name": "Course-X"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_subjects() {
    let app = test_app();
    seed(&app).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/subjects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], serde_json::json!("Aarav Sharma"));
}

// -- Lookup -------------------------------------------------------------------

#[tokio::test]
async fn test_lookup_by_contact() {
    let app = test_app();
    seed(&app).await;
    let credential_id = issue(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/lookup",
            serde_json::json!({"contact": "aarav@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["subject"]["id"], serde_json::json!("S1"));
    assert_eq!(
        body["credentials"][0]["id"],
        serde_json::json!(credential_id)
    );
}

#[tokio::test]
async fn test_lookup_requires_exactly_one_key() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(post_json("/api/lookup", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .oneshot(post_json(
            "/api/lookup",
            serde_json::json!({"subject_id": "S1", "contact": "aarav@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Institutions -------------------------------------------------------------

#[tokio::test]
async fn test_institution_grant_minter_flow() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/institutions",
            serde_json::json!({"name": "NCVET", "identity_key": "key-ncvet"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/institutions/grant-minter",
            serde_json::json!({"identity_key": "key-ncvet"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["is_minter"], serde_json::json!(true));

    // Granting twice conflicts.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/institutions/grant-minter",
            serde_json::json!({"identity_key": "key-ncvet"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Unknown institution is 404.
    let response = app
        .oneshot(post_json(
            "/api/institutions/grant-minter",
            serde_json::json!({"identity_key": "key-ghost"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
