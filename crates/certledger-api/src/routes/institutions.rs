//! # Institution Administration
//!
//! Routes:
//! - GET  /api/institutions — List institutions
//! - POST /api/institutions — Register an institution
//! - POST /api/institutions/grant-minter — Grant minter rights
//!
//! Granting minter rights mutates the verification ledger, so it runs
//! through the orchestrator with the same commit-then-record
//! discipline as issuance.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use certledger_registry::{CredentialRegistry, Institution};

use crate::error::AppError;
use crate::state::AppState;

/// Request to register an institution.
#[derive(Debug, Deserialize)]
pub struct RegisterInstitutionRequest {
    pub name: String,
    pub identity_key: String,
}

/// Request to grant minter rights.
#[derive(Debug, Deserialize)]
pub struct GrantMinterRequest {
    pub identity_key: String,
}

/// Build the institutions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/institutions",
            post(register_institution).get(list_institutions),
        )
        .route("/api/institutions/grant-minter", post(grant_minter))
}

/// GET /api/institutions — List institutions, ordered by name.
async fn list_institutions(State(state): State<AppState>) -> Json<Vec<Institution>> {
    Json(state.registry.institutions().await)
}

/// POST /api/institutions — Register an institution.
async fn register_institution(
    State(state): State<AppState>,
    Json(req): Json<RegisterInstitutionRequest>,
) -> Result<(StatusCode, Json<Institution>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    if req.identity_key.trim().is_empty() {
        return Err(AppError::Validation(
            "identity_key must not be empty".to_string(),
        ));
    }
    let institution = state
        .registry
        .create_institution(req.name.trim().to_string(), req.identity_key.trim().to_string())
        .await?;
    Ok((StatusCode::CREATED, Json(institution)))
}

/// POST /api/institutions/grant-minter — Grant minter rights.
async fn grant_minter(
    State(state): State<AppState>,
    Json(req): Json<GrantMinterRequest>,
) -> Result<Json<Institution>, AppError> {
    let key = req.identity_key.trim().to_string();
    if key.is_empty() {
        return Err(AppError::Validation(
            "identity_key must not be empty".to_string(),
        ));
    }
    let orchestrator = state.orchestrator.clone();
    let institution = tokio::spawn(async move { orchestrator.grant_minter(&key).await })
        .await
        .map_err(|e| AppError::Internal(format!("grant task failed: {e}")))??;
    Ok(Json(institution))
}
