//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps the domain error taxonomy onto HTTP status codes with a JSON
//! error envelope. The mapping mirrors how far an operation progressed:
//! state conflicts are 409, validation is 422, retryable external-store
//! failures are 503, and a post-confirmation inconsistency is 500 with
//! its own code so callers know not to retry.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use certledger_anchor::LedgerError;
use certledger_core::ValidationError;
use certledger_issuance::{AdminError, IssueError, RevokeError, VerifyError};
use certledger_registry::RegistryError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An external store is unreachable; the request may be retried
    /// (503).
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The operation is ledger-confirmed but unsettled; reconciliation
    /// owns completion and the caller must not retry (500, distinct
    /// code).
    #[error("recoverable inconsistency: {0}")]
    Inconsistency(String),

    /// Internal server error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The HTTP status code and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Inconsistency(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "RECOVERABLE_INCONSISTENCY")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Internal error details never reach the client.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Inconsistency(_) => {
                tracing::warn!(error = %self, "recoverable inconsistency surfaced to caller");
            }
            Self::Unavailable(_) => tracing::warn!(error = %self, "external store unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Registry rejections: missing resources are 404, everything else is
/// a state conflict.
impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match &err {
            RegistryError::SubjectNotFound { .. }
            | RegistryError::ContactNotFound { .. }
            | RegistryError::CredentialNotFound { .. }
            | RegistryError::InstitutionNotFound { .. }
            | RegistryError::NotEnrolled { .. }
            | RegistryError::IntentNotFound { .. } => Self::NotFound(err.to_string()),
            RegistryError::DuplicateSubject { .. }
            | RegistryError::DuplicateContact { .. }
            | RegistryError::DuplicateInstitution { .. }
            | RegistryError::AlreadyEnrolled { .. }
            | RegistryError::Enrollment(_)
            | RegistryError::Credential(_)
            | RegistryError::LedgerConfirmed { .. } => Self::Conflict(err.to_string()),
        }
    }
}

/// Ledger failures: unreachability is retryable, contract rejections
/// are conflicts.
impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::Unavailable(_) => Self::Unavailable(err.to_string()),
            LedgerError::AlreadyCommitted { .. }
            | LedgerError::NotCommitted { .. }
            | LedgerError::AlreadyRevoked { .. } => Self::Conflict(err.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<IssueError> for AppError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::Registry(e) => e.into(),
            IssueError::Ledger(e) => e.into(),
            IssueError::RecoverableInconsistency { .. } => Self::Inconsistency(err.to_string()),
        }
    }
}

impl From<RevokeError> for AppError {
    fn from(err: RevokeError) -> Self {
        match err {
            RevokeError::Registry(e) => e.into(),
            RevokeError::Ledger(e) => e.into(),
            RevokeError::RecoverableInconsistency { .. } => Self::Inconsistency(err.to_string()),
        }
    }
}

impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::NotFound { .. } => Self::NotFound(err.to_string()),
            VerifyError::Ledger(e) => e.into(),
        }
    }
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Registry(e) => e.into(),
            AdminError::AlreadyMinter { .. } => Self::Conflict(err.to_string()),
            AdminError::Ledger(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certledger_core::{CredentialId, SubjectId};

    #[test]
    fn not_found_status_code() {
        let err = AppError::NotFound("missing subject".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }

    #[test]
    fn validation_status_code() {
        let err = AppError::Validation("empty field".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "VALIDATION_ERROR");
    }

    #[test]
    fn conflict_status_code() {
        let err = AppError::Conflict("already certified".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "CONFLICT");
    }

    #[test]
    fn unavailable_status_code() {
        let err = AppError::Unavailable("ledger timeout".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "SERVICE_UNAVAILABLE");
    }

    #[test]
    fn inconsistency_has_distinct_code() {
        let err = AppError::Inconsistency("unsettled issuance".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "RECOVERABLE_INCONSISTENCY");
    }

    #[test]
    fn registry_not_found_maps_to_404() {
        let err = AppError::from(RegistryError::SubjectNotFound {
            id: SubjectId::new("2001").unwrap(),
        });
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn registry_conflicts_map_to_409() {
        let err = AppError::from(RegistryError::AlreadyEnrolled {
            subject: SubjectId::new("2001").unwrap(),
            course: certledger_core::CourseName::new("Wood Carving").unwrap(),
        });
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn ledger_unavailable_maps_to_503() {
        let err = AppError::from(LedgerError::Unavailable("timeout".to_string()));
        assert!(matches!(err, AppError::Unavailable(_)));
    }

    #[test]
    fn recoverable_inconsistency_maps_to_500_with_code() {
        let err = AppError::from(IssueError::RecoverableInconsistency {
            id: CredentialId::generate(),
            cause: "archive put".to_string(),
        });
        assert!(matches!(err, AppError::Inconsistency(_)));
    }

    #[test]
    fn verify_not_found_maps_to_404() {
        let err = AppError::from(VerifyError::NotFound {
            id: CredentialId::generate(),
        });
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        use http_body_util::BodyExt;

        let response = AppError::Internal("store poisoned".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(!body.error.message.contains("store poisoned"));
    }

    #[tokio::test]
    async fn into_response_conflict_keeps_message() {
        use http_body_util::BodyExt;

        let response = AppError::Conflict("already revoked".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert!(body.error.message.contains("already revoked"));
    }
}
