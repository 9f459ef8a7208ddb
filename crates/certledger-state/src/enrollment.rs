//! # Enrollment Lifecycle State Machine
//!
//! Models a subject's registration in a course, tracked independently of
//! whether a credential has been issued for it.
//!
//! ## States
//!
//! ```text
//! Enrolled ──▶ Issuing ──▶ Certified ──▶ Revoked (terminal)
//!     ▲           │
//!     └───────────┘ (release — issuance aborted before ledger commit)
//! ```
//!
//! `Issuing` is the exclusive lease the orchestrator holds while it
//! talks to the verification ledger; only one concurrent issuance can
//! move an enrollment out of `Enrolled`. The release edge is legal only
//! while the ledger has not confirmed a commitment — the registry
//! enforces that by refusing release once a transaction reference is
//! recorded on the in-flight intent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use certledger_core::{CourseName, CredentialId, Timestamp};

// ─── Status ──────────────────────────────────────────────────────────

/// The lifecycle status of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    /// Enrolled in the course; no credential issued.
    Enrolled,
    /// An issuance holds the exclusive lease on this enrollment.
    Issuing,
    /// A credential has been issued for this enrollment.
    Certified,
    /// The issued credential has been revoked (terminal).
    Revoked,
}

impl EnrollmentStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked)
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Enrolled => "ENROLLED",
            Self::Issuing => "ISSUING",
            Self::Certified => "CERTIFIED",
            Self::Revoked => "REVOKED",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by enrollment lifecycle transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentError {
    /// Another issuance currently holds the lease.
    #[error("issuance already in progress for course {course}")]
    IssuanceInProgress {
        /// The contended course.
        course: CourseName,
    },

    /// The enrollment is already certified.
    #[error("enrollment in course {course} is already certified")]
    AlreadyCertified {
        /// The certified course.
        course: CourseName,
    },

    /// The enrollment has been revoked; no re-issuance path exists.
    #[error("enrollment in course {course} has been revoked")]
    Revoked {
        /// The revoked course.
        course: CourseName,
    },

    /// Attempted transition is not valid from the current status.
    #[error("invalid enrollment transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: EnrollmentStatus,
        /// Attempted target status.
        to: EnrollmentStatus,
    },
}

// ─── Transition Record ───────────────────────────────────────────────

/// Record of one enrollment status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentTransition {
    /// Status before the transition.
    pub from: EnrollmentStatus,
    /// Status after the transition.
    pub to: EnrollmentStatus,
    /// When the transition occurred.
    pub at: Timestamp,
}

// ─── Enrollment ──────────────────────────────────────────────────────

/// A subject's registration in one course, with its lifecycle status
/// and transition history. The owning subject is implied by where the
/// enrollment is embedded in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    /// The course this enrollment is for.
    pub course: CourseName,
    /// Current lifecycle status.
    pub status: EnrollmentStatus,
    /// The credential issued for this enrollment, once certified.
    pub credential: Option<CredentialId>,
    /// When the subject enrolled.
    pub enrolled_at: Timestamp,
    /// Ordered log of status transitions.
    pub transitions: Vec<EnrollmentTransition>,
}

impl Enrollment {
    /// Create a fresh enrollment in the given course.
    pub fn new(course: CourseName) -> Self {
        Self {
            course,
            status: EnrollmentStatus::Enrolled,
            credential: None,
            enrolled_at: Timestamp::now(),
            transitions: Vec::new(),
        }
    }

    /// Take the issuance lease (ENROLLED → ISSUING).
    ///
    /// Exactly one caller can succeed; the status-specific errors let
    /// the orchestrator answer concurrent and repeated requests
    /// distinctly (`IssuanceInProgress` vs `AlreadyCertified`).
    pub fn begin_issuance(&mut self) -> Result<(), EnrollmentError> {
        match self.status {
            EnrollmentStatus::Enrolled => {
                self.transition(EnrollmentStatus::Issuing);
                Ok(())
            }
            EnrollmentStatus::Issuing => Err(EnrollmentError::IssuanceInProgress {
                course: self.course.clone(),
            }),
            EnrollmentStatus::Certified => Err(EnrollmentError::AlreadyCertified {
                course: self.course.clone(),
            }),
            EnrollmentStatus::Revoked => Err(EnrollmentError::Revoked {
                course: self.course.clone(),
            }),
        }
    }

    /// Settle a successful issuance (ISSUING → CERTIFIED), linking the
    /// issued credential.
    pub fn certify(&mut self, credential: CredentialId) -> Result<(), EnrollmentError> {
        self.require(EnrollmentStatus::Issuing, EnrollmentStatus::Certified)?;
        self.credential = Some(credential);
        self.transition(EnrollmentStatus::Certified);
        Ok(())
    }

    /// Release the lease after an issuance aborted before the ledger
    /// commit (ISSUING → ENROLLED).
    pub fn release(&mut self) -> Result<(), EnrollmentError> {
        self.require(EnrollmentStatus::Issuing, EnrollmentStatus::Enrolled)?;
        self.transition(EnrollmentStatus::Enrolled);
        Ok(())
    }

    /// Revoke a certified enrollment (CERTIFIED → REVOKED).
    pub fn revoke(&mut self) -> Result<(), EnrollmentError> {
        self.require(EnrollmentStatus::Certified, EnrollmentStatus::Revoked)?;
        self.transition(EnrollmentStatus::Revoked);
        Ok(())
    }

    fn require(
        &self,
        expected: EnrollmentStatus,
        target: EnrollmentStatus,
    ) -> Result<(), EnrollmentError> {
        if self.status != expected {
            return Err(EnrollmentError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        Ok(())
    }

    fn transition(&mut self, to: EnrollmentStatus) {
        self.transitions.push(EnrollmentTransition {
            from: self.status,
            to,
            at: Timestamp::now(),
        });
        self.status = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
