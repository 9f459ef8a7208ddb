//! # Orchestration Error Taxonomy
//!
//! Four classes, matching how far an operation progressed:
//!
//! - **Validation / state-conflict**: surfaced through the wrapped
//!   [`RegistryError`] before any external call; no side effects.
//! - **External-store failure before ledger confirmation**: the wrapped
//!   [`LedgerError`]; the lease has been released and the caller may
//!   retry the whole operation.
//! - **RecoverableInconsistency**: a failure *after* the ledger
//!   confirmed. The caller must not retry (a fresh attempt would
//!   re-commit an already-committed fingerprint); the reconciliation
//!   pass owns completion and the in-flight intent is retained for it.
//! - **Verification**: `NotFound` is distinct from "invalid" and is
//!   reported without consulting the ledger.

use thiserror::Error;

use certledger_anchor::LedgerError;
use certledger_core::CredentialId;
use certledger_registry::RegistryError;

/// Errors from [`IssuanceOrchestrator::issue`](crate::IssuanceOrchestrator::issue).
#[derive(Error, Debug)]
pub enum IssueError {
    /// Rejected by registry state before any external call: unknown
    /// subject/enrollment, already certified, revoked, or another
    /// issuance in progress.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The ledger commit failed. The lease was released; the operation
    /// left no side effects and may be retried.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A step failed after the ledger confirmed the commitment. The
    /// in-flight intent is retained; reconciliation will finish the
    /// issuance. Do not retry the call.
    #[error("issuance of credential {id} is ledger-committed but unsettled ({cause}); reconciliation will complete it")]
    RecoverableInconsistency {
        /// The affected credential.
        id: CredentialId,
        /// The failing step.
        cause: String,
    },
}

/// Errors from [`IssuanceOrchestrator::revoke`](crate::IssuanceOrchestrator::revoke).
#[derive(Error, Debug)]
pub enum RevokeError {
    /// Rejected by registry state before any external call: unknown
    /// credential, already revoked, or another revocation in progress.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The ledger revocation failed. The lease was released and the
    /// call may be retried.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A step failed after the ledger confirmed the revocation. The
    /// intent is retained; reconciliation will finish it.
    #[error("revocation of credential {id} is ledger-confirmed but unsettled ({cause}); reconciliation will complete it")]
    RecoverableInconsistency {
        /// The affected credential.
        id: CredentialId,
        /// The failing step.
        cause: String,
    },
}

/// Errors from [`VerificationService::verify`](crate::VerificationService::verify).
#[derive(Error, Debug)]
pub enum VerifyError {
    /// No credential with this id was ever issued. Reported without a
    /// ledger call, and distinct from an *invalid* credential.
    #[error("credential {id} not found")]
    NotFound {
        /// The unknown credential.
        id: CredentialId,
    },

    /// The ledger could not be queried.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Errors from the administrative institution operations.
#[derive(Error, Debug)]
pub enum AdminError {
    /// Institution lookup or persistence failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The institution already holds minter rights.
    #[error("institution {name} is already a minter")]
    AlreadyMinter {
        /// The institution.
        name: String,
    },

    /// The ledger grant failed; nothing was recorded.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
