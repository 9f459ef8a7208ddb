//! # Registry Documents
//!
//! The persisted shapes of the registry: subjects (with embedded
//! enrollments), institutions, and the in-flight intents that survive a
//! crash between the ledger confirmation and the registry settlement.

use serde::{Deserialize, Serialize};

use certledger_core::{
    ContactHandle, CourseName, CredentialId, Fingerprint, SubjectId, Timestamp, TransactionRef,
};
use certledger_state::Enrollment;

/// A credential holder: identity plus the ordered list of enrollments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// Opaque unique identifier, immutable once assigned.
    pub id: SubjectId,
    /// Display name. Mutable by administrative action; issued
    /// credential records keep their own snapshot.
    pub name: String,
    /// Optional contact handle, unique across subjects when present.
    pub contact: Option<ContactHandle>,
    /// Enrollments, keyed by course within this subject.
    pub enrollments: Vec<Enrollment>,
}

impl Subject {
    /// The enrollment for the given course, if any.
    pub fn enrollment(&self, course: &CourseName) -> Option<&Enrollment> {
        self.enrollments.iter().find(|e| &e.course == course)
    }

    /// Mutable access to the enrollment for the given course.
    pub fn enrollment_mut(&mut self, course: &CourseName) -> Option<&mut Enrollment> {
        self.enrollments.iter_mut().find(|e| &e.course == course)
    }
}

/// An administrative entity that can be granted credential-minting
/// rights on the verification ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institution {
    /// Unique institution name.
    pub name: String,
    /// Unique identity credential (wallet address or public-key
    /// reference) the ledger grants rights to.
    pub identity_key: String,
    /// Whether minter rights have been granted and recorded.
    pub is_minter: bool,
    /// Ledger transaction reference of the grant, once recorded.
    pub grant_ref: Option<TransactionRef>,
}

/// The durable marker of an issuance that has taken its lease.
///
/// Carries everything the reconciliation pass needs to re-drive the
/// post-commit steps: the credential id, the **name snapshot taken when
/// the lease was acquired** (a rename mid-flight must not change what
/// gets rendered or fingerprinted), the fingerprint, and the ledger
/// confirmation once recorded. An intent with a `transaction_ref` can
/// no longer be aborted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuanceIntent {
    /// The credential id generated for this issuance.
    pub credential_id: CredentialId,
    /// The subject being certified.
    pub subject_id: SubjectId,
    /// Subject display name snapshot at lease acquisition.
    pub subject_name: String,
    /// The course being certified.
    pub course: CourseName,
    /// The fingerprint to commit (computed from the snapshot).
    pub fingerprint: Fingerprint,
    /// Ledger confirmation, recorded as soon as the commit finalizes.
    pub transaction_ref: Option<TransactionRef>,
    /// When the lease was acquired.
    pub started_at: Timestamp,
}

/// The durable marker of a revocation that has taken its lease.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationIntent {
    /// The credential being revoked.
    pub credential_id: CredentialId,
    /// The fingerprint to revoke (from the record's snapshot).
    pub fingerprint: Fingerprint,
    /// Set once the ledger revocation finalizes; the intent can no
    /// longer be aborted afterwards.
    pub ledger_confirmed: bool,
    /// When the lease was acquired.
    pub started_at: Timestamp,
}
