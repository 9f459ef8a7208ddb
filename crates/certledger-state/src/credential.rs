//! # Credential Record Lifecycle
//!
//! The registry's canonical record of one issued credential. Created
//! only by a successful issuance, mutated only to move through
//! revocation, never deleted.
//!
//! ## States
//!
//! ```text
//! Issued ──▶ Revoking ──▶ Revoked (terminal)
//!    ▲          │
//!    └──────────┘ (release — revocation aborted before ledger call)
//! ```
//!
//! ## Snapshot Invariant
//!
//! The record stores the subject-name **snapshot** taken at issuance.
//! Every later fingerprint recomputation (revoke, verify, reconcile)
//! uses the snapshot, never the live subject record — a rename after
//! issuance must not change the committed fingerprint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use certledger_core::{
    fingerprint, ContentAddress, CourseName, CredentialId, Fingerprint, SubjectId, Timestamp,
    TransactionRef,
};

// ─── Status ──────────────────────────────────────────────────────────

/// The lifecycle status of a credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialStatus {
    /// Issued and, absent ledger divergence, verifiable.
    Issued,
    /// A revocation holds the exclusive lease on this record.
    Revoking,
    /// Revoked (terminal).
    Revoked,
}

impl CredentialStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked)
    }
}

impl std::fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Issued => "ISSUED",
            Self::Revoking => "REVOKING",
            Self::Revoked => "REVOKED",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by credential record transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The credential is already revoked.
    #[error("credential {id} is already revoked")]
    AlreadyRevoked {
        /// The revoked credential.
        id: CredentialId,
    },

    /// Another revocation currently holds the lease.
    #[error("revocation already in progress for credential {id}")]
    RevocationInProgress {
        /// The contended credential.
        id: CredentialId,
    },

    /// Attempted transition is not valid from the current status.
    #[error("invalid credential transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: CredentialStatus,
        /// Attempted target status.
        to: CredentialStatus,
    },
}

// ─── Credential Record ───────────────────────────────────────────────

/// The canonical record of one issued credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Unique identifier, generated at issuance, immutable.
    pub id: CredentialId,
    /// The holder's subject id.
    pub subject_id: SubjectId,
    /// The holder's display name as it was at issuance.
    pub subject_name: String,
    /// The certified course.
    pub course: CourseName,
    /// The fingerprint committed to the verification ledger.
    pub fingerprint: Fingerprint,
    /// Ledger transaction reference for the commitment.
    pub transaction_ref: TransactionRef,
    /// Content archive address of the rendered document.
    pub content_address: ContentAddress,
    /// Current lifecycle status.
    pub status: CredentialStatus,
    /// When the credential was issued.
    pub issued_at: Timestamp,
    /// When the credential was revoked, if it has been.
    pub revoked_at: Option<Timestamp>,
}

impl CredentialRecord {
    /// Create the record for a freshly issued credential.
    ///
    /// `subject_name` becomes the immutable snapshot; `fp` must be the
    /// fingerprint committed to the ledger for exactly these fields.
    #[allow(clippy::too_many_arguments)]
    pub fn issued(
        id: CredentialId,
        subject_id: SubjectId,
        subject_name: String,
        course: CourseName,
        fp: Fingerprint,
        transaction_ref: TransactionRef,
        content_address: ContentAddress,
    ) -> Self {
        Self {
            id,
            subject_id,
            subject_name,
            course,
            fingerprint: fp,
            transaction_ref,
            content_address,
            status: CredentialStatus::Issued,
            issued_at: Timestamp::now(),
            revoked_at: None,
        }
    }

    /// Recompute the fingerprint from the stored snapshot fields.
    ///
    /// For an untampered record this equals `self.fingerprint`; the
    /// verification service recomputes rather than trusting the stored
    /// column so a corrupted snapshot surfaces as a ledger mismatch
    /// instead of silently verifying.
    pub fn snapshot_fingerprint(&self) -> Fingerprint {
        fingerprint(&self.subject_name, &self.subject_id, &self.course)
    }

    /// Take the revocation lease (ISSUED → REVOKING).
    pub fn begin_revocation(&mut self) -> Result<(), CredentialError> {
        match self.status {
            CredentialStatus::Issued => {
                self.status = CredentialStatus::Revoking;
                Ok(())
            }
            CredentialStatus::Revoking => {
                Err(CredentialError::RevocationInProgress { id: self.id })
            }
            CredentialStatus::Revoked => Err(CredentialError::AlreadyRevoked { id: self.id }),
        }
    }

    /// Settle a confirmed revocation (REVOKING → REVOKED).
    pub fn complete_revocation(&mut self) -> Result<(), CredentialError> {
        self.require(CredentialStatus::Revoking, CredentialStatus::Revoked)?;
        self.status = CredentialStatus::Revoked;
        self.revoked_at = Some(Timestamp::now());
        Ok(())
    }

    /// Release the lease after a revocation aborted before the ledger
    /// call (REVOKING → ISSUED).
    pub fn release_revocation(&mut self) -> Result<(), CredentialError> {
        self.require(CredentialStatus::Revoking, CredentialStatus::Issued)?;
        self.status = CredentialStatus::Issued;
        Ok(())
    }

    fn require(
        &self,
        expected: CredentialStatus,
        target: CredentialStatus,
    ) -> Result<(), CredentialError> {
        if self.status != expected {
            return Err(CredentialError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
