//! # Credential Operations
//!
//! Routes:
//! - POST /api/issue — Issue a credential for (subject, course)
//! - POST /api/revoke — Revoke an issued credential
//! - POST /api/verify — Verify a credential id
//! - POST /api/lookup — Subject profile by id or contact handle
//!
//! The mutating handlers spawn the orchestrator call onto the runtime:
//! once the ledger step has started it runs to completion server-side,
//! and a client disconnect is not a cancellation signal.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use certledger_core::{ContactHandle, CourseName, CredentialId, SubjectId};
use certledger_issuance::{IssueOutcome, SubjectProfile, SubjectRef, VerifyReport};

use crate::error::AppError;
use crate::state::AppState;

/// Request to issue a credential.
#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    pub subject_id: String,
    pub course_name: String,
}

/// Request to revoke a credential.
#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub credential_id: String,
}

/// Revocation confirmation.
#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub credential_id: CredentialId,
    pub revoked: bool,
}

/// Request to verify a credential.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub credential_id: String,
}

/// Request to look a subject up. Exactly one of the fields must be
/// present.
#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

/// Build the credential operations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/issue", post(issue))
        .route("/api/revoke", post(revoke))
        .route("/api/verify", post(verify))
        .route("/api/lookup", post(lookup))
}

/// POST /api/issue — Issue a credential.
async fn issue(
    State(state): State<AppState>,
    Json(req): Json<IssueRequest>,
) -> Result<(StatusCode, Json<IssueOutcome>), AppError> {
    let subject_id = SubjectId::new(&req.subject_id)?;
    let course = CourseName::new(&req.course_name)?;

    let orchestrator = state.orchestrator.clone();
    let outcome = tokio::spawn(async move { orchestrator.issue(&subject_id, &course).await })
        .await
        .map_err(|e| AppError::Internal(format!("issuance task failed: {e}")))??;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /api/revoke — Revoke a credential.
async fn revoke(
    State(state): State<AppState>,
    Json(req): Json<RevokeRequest>,
) -> Result<Json<RevokeResponse>, AppError> {
    let credential_id = CredentialId::parse(&req.credential_id)?;

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move { orchestrator.revoke(&credential_id).await })
        .await
        .map_err(|e| AppError::Internal(format!("revocation task failed: {e}")))??;
    Ok(Json(RevokeResponse {
        credential_id,
        revoked: true,
    }))
}

/// POST /api/verify — Verify a credential id.
async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyReport>, AppError> {
    let credential_id = CredentialId::parse(&req.credential_id)?;
    let report = state.verifier.verify(&credential_id).await?;
    Ok(Json(report))
}

/// POST /api/lookup — Subject profile by id or contact handle.
async fn lookup(
    State(state): State<AppState>,
    Json(req): Json<LookupRequest>,
) -> Result<Json<SubjectProfile>, AppError> {
    let subject_ref = match (&req.subject_id, &req.contact) {
        (Some(id), None) => SubjectRef::Id(SubjectId::new(id)?),
        (None, Some(handle)) => SubjectRef::Contact(ContactHandle::new(handle)?),
        _ => {
            return Err(AppError::Validation(
                "provide exactly one of subject_id or contact".to_string(),
            ));
        }
    };
    let profile = state.verifier.lookup(&subject_ref).await?;
    Ok(Json(profile))
}
