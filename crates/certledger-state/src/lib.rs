//! # certledger-state — Credential Lifecycle State Machines
//!
//! Closed state machines for the two registry lifecycles:
//!
//! - **Enrollment** (`enrollment.rs`):
//!   `Enrolled → Issuing → Certified → Revoked`, with the single release
//!   edge `Issuing → Enrolled` for an issuance aborted before the ledger
//!   was touched.
//!
//! - **CredentialRecord** (`credential.rs`):
//!   `Issued → Revoking → Revoked`, with the release edge
//!   `Revoking → Issued` for a revocation aborted before the ledger was
//!   touched.
//!
//! ## Design
//!
//! Statuses are closed enums, not strings — an invalid transition is
//! rejected by a `Result`, and a nonsensical one (certifying a record,
//! revoking an enrollment that has no credential) does not exist as a
//! method. `Issuing`/`Revoking` are the explicit in-flight lease
//! sub-states the orchestration layer acquires before calling the
//! verification ledger; the externally observable sequence of settled
//! states remains a prefix of Enrolled, Certified, Revoked.

pub mod credential;
pub mod enrollment;

pub use credential::{CredentialError, CredentialRecord, CredentialStatus};
pub use enrollment::{Enrollment, EnrollmentError, EnrollmentStatus, EnrollmentTransition};
