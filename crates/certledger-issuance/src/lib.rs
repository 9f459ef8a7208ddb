//! # certledger-issuance — Issuance, Revocation, and Verification
//!
//! The core of CertLedger. A credential's truth is split across three
//! independently-failing stores — the mutable registry, the immutable
//! content archive, and the append-only verification ledger — and this
//! crate is what keeps them coherent:
//!
//! - [`IssuanceOrchestrator`] drives issue and revoke across the three
//!   stores in reverse order of "cheap to undo": the ledger commitment
//!   comes first (nothing else has been written if it fails), the
//!   archive and registry follow and are re-driven until they succeed.
//!   The per-enrollment lease (`Issuing`/`Revoking`) serializes
//!   concurrent requests; the [`reconcile`](IssuanceOrchestrator::reconcile)
//!   pass finishes any operation interrupted after its ledger call
//!   confirmed.
//!
//! - [`VerificationService`] reconciles registry state against ledger
//!   state for a credential id and reports a trust verdict. Divergence
//!   between the stores is a first-class verdict
//!   ([`InvalidReason::LedgerMismatch`]), never masked.
//!
//! - [`CredentialRenderer`] is the seam to the external document
//!   renderer; [`TextRenderer`] is the reference implementation.
//!
//! Clients are injected at construction as `Arc` handles — nothing in
//! this crate owns a connection or reads configuration.

pub mod error;
pub mod orchestrator;
pub mod render;
pub mod verification;

pub use error::{AdminError, IssueError, RevokeError, VerifyError};
pub use orchestrator::{IssuanceOrchestrator, IssueOutcome, ReconcileReport};
pub use render::{CredentialRenderer, RenderError, RenderRequest, TextRenderer};
pub use verification::{
    InvalidReason, SubjectProfile, SubjectRef, VerificationService, VerifyReport,
};
