//! # Application State
//!
//! Shared handles for the route handlers. Everything is an `Arc` built
//! by the process entry point — handlers never construct clients.

use std::sync::Arc;

use certledger_issuance::{IssuanceOrchestrator, VerificationService};
use certledger_registry::CredentialRegistry;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Issue/revoke/reconcile orchestration.
    pub orchestrator: Arc<IssuanceOrchestrator>,
    /// Verify/lookup queries.
    pub verifier: Arc<VerificationService>,
    /// Direct registry access for the administrative routes.
    pub registry: Arc<dyn CredentialRegistry>,
}

impl AppState {
    /// Assemble application state from constructed services.
    pub fn new(
        orchestrator: Arc<IssuanceOrchestrator>,
        verifier: Arc<VerificationService>,
        registry: Arc<dyn CredentialRegistry>,
    ) -> Self {
        Self {
            orchestrator,
            verifier,
            registry,
        }
    }
}
