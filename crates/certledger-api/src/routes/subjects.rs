//! # Subject Administration
//!
//! Routes:
//! - POST /api/subjects — Register a subject
//! - GET  /api/subjects — List subjects (admin console listing)
//! - POST /api/enroll — Enroll a subject in a course

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use certledger_core::{ContactHandle, CourseName, SubjectId};
use certledger_registry::{CredentialRegistry, Subject};

use crate::error::AppError;
use crate::state::AppState;

/// Request to register a subject.
#[derive(Debug, Deserialize)]
pub struct RegisterSubjectRequest {
    pub subject_id: String,
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
}

/// Request to enroll a subject in a course.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub subject_id: String,
    pub course_name: String,
}

/// Build the subjects router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/subjects", post(register_subject).get(list_subjects))
        .route("/api/enroll", post(enroll))
}

/// POST /api/subjects — Register a subject.
async fn register_subject(
    State(state): State<AppState>,
    Json(req): Json<RegisterSubjectRequest>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    let id = SubjectId::new(&req.subject_id)?;
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    let contact = req
        .contact
        .as_deref()
        .map(ContactHandle::new)
        .transpose()?;
    let subject = state
        .registry
        .create_subject(id, req.name.trim().to_string(), contact)
        .await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

/// GET /api/subjects — List subjects, ordered by name.
async fn list_subjects(State(state): State<AppState>) -> Json<Vec<Subject>> {
    Json(state.registry.list_subjects().await)
}

/// POST /api/enroll — Enroll a subject in a course.
async fn enroll(
    State(state): State<AppState>,
    Json(req): Json<EnrollRequest>,
) -> Result<Json<Subject>, AppError> {
    let id = SubjectId::new(&req.subject_id)?;
    let course = CourseName::new(&req.course_name)?;
    let subject = state.registry.enroll(&id, course).await?;
    Ok(Json(subject))
}
