//! # Verification Service
//!
//! Reconciles registry state against ledger state for a credential id
//! and reports a trust verdict. The registry's `Revoked` status is
//! authoritative for user-facing reporting (it was only ever set after
//! a successful ledger revocation); in every other case the ledger is
//! consulted, and a disagreement between the stores is surfaced as its
//! own verdict — a partial failure must look different from an
//! ordinary revocation.

use std::sync::Arc;

use serde::Serialize;

use certledger_anchor::VerificationLedger;
use certledger_archive::ContentArchive;
use certledger_core::{ContactHandle, CourseName, CredentialId, SubjectId};
use certledger_registry::{CredentialRegistry, RegistryError, Subject};
use certledger_state::{CredentialRecord, CredentialStatus};

use crate::error::VerifyError;

/// Why a credential failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// Revoked by the issuer; registry and ledger agree.
    Revoked,
    /// The registry says Issued but the ledger says invalid. The
    /// stores have diverged (e.g. a partial failure during revoke)
    /// and an operator should investigate.
    LedgerMismatch,
}

/// The verdict for one credential id.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    /// Whether the credential verified.
    pub valid: bool,
    /// Failure reason when `valid` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InvalidReason>,
    /// Subject display name (issuance-time snapshot).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    /// The certified course.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<CourseName>,
    /// Resolvable link to the archived credential document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_link: Option<String>,
}

impl VerifyReport {
    fn revoked() -> Self {
        Self {
            valid: false,
            reason: Some(InvalidReason::Revoked),
            subject_name: None,
            course: None,
            content_link: None,
        }
    }

    fn valid(record: &CredentialRecord, content_link: Option<String>) -> Self {
        Self {
            valid: true,
            reason: None,
            subject_name: Some(record.subject_name.clone()),
            course: Some(record.course.clone()),
            content_link,
        }
    }

    fn mismatch(record: &CredentialRecord) -> Self {
        Self {
            valid: false,
            reason: Some(InvalidReason::LedgerMismatch),
            subject_name: Some(record.subject_name.clone()),
            course: Some(record.course.clone()),
            content_link: None,
        }
    }
}

/// How to look a subject up.
#[derive(Debug, Clone)]
pub enum SubjectRef {
    /// By subject id.
    Id(SubjectId),
    /// By contact handle.
    Contact(ContactHandle),
}

/// A subject together with its currently issued credentials.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectProfile {
    /// The subject.
    pub subject: Subject,
    /// Credential records with status `Issued`. Revoked records are
    /// excluded from this positive listing but retained in storage.
    pub credentials: Vec<CredentialRecord>,
}

/// Read-side service answering verify and lookup queries.
pub struct VerificationService {
    registry: Arc<dyn CredentialRegistry>,
    ledger: Arc<dyn VerificationLedger>,
    archive: Arc<dyn ContentArchive>,
}

impl VerificationService {
    /// Construct a verification service over the injected clients.
    pub fn new(
        registry: Arc<dyn CredentialRegistry>,
        ledger: Arc<dyn VerificationLedger>,
        archive: Arc<dyn ContentArchive>,
    ) -> Self {
        Self {
            registry,
            ledger,
            archive,
        }
    }

    /// Verify a credential id.
    ///
    /// - Unknown id: [`VerifyError::NotFound`], with no ledger call.
    /// - Registry says Revoked: invalid/revoked, independent of ledger
    ///   state.
    /// - Otherwise the fingerprint is recomputed from the stored
    ///   snapshot and checked against the ledger; agreement yields a
    ///   valid verdict with the subject, course, and content link,
    ///   disagreement yields invalid/ledger-mismatch.
    pub async fn verify(&self, credential_id: &CredentialId) -> Result<VerifyReport, VerifyError> {
        let record = match self.registry.credential(credential_id).await {
            Ok(record) => record,
            Err(RegistryError::CredentialNotFound { id }) => {
                return Err(VerifyError::NotFound { id });
            }
            Err(e) => {
                // The in-memory credential lookup only fails NotFound;
                // treat anything else as an unknown credential rather
                // than inventing a verdict.
                tracing::error!(credential = %credential_id, error = %e, "credential lookup failed");
                return Err(VerifyError::NotFound { id: *credential_id });
            }
        };

        if record.status == CredentialStatus::Revoked {
            metrics::counter!("certledger_verifications_total").increment(1);
            return Ok(VerifyReport::revoked());
        }

        // Recompute from the snapshot rather than trusting the stored
        // fingerprint column: a tampered snapshot then surfaces as a
        // ledger mismatch instead of silently verifying.
        let fp = record.snapshot_fingerprint();
        let valid = self.ledger.is_valid(&fp).await?;
        metrics::counter!("certledger_verifications_total").increment(1);

        if valid {
            let content_link = match self.archive.resolve(&record.content_address).await {
                Ok(link) => Some(link),
                Err(e) => {
                    tracing::warn!(
                        credential = %credential_id,
                        error = %e,
                        "content link unresolvable for valid credential"
                    );
                    None
                }
            };
            Ok(VerifyReport::valid(&record, content_link))
        } else {
            tracing::warn!(
                credential = %credential_id,
                status = %record.status,
                "registry/ledger divergence detected"
            );
            metrics::counter!("certledger_ledger_mismatches_total").increment(1);
            Ok(VerifyReport::mismatch(&record))
        }
    }

    /// Look a subject up by id or contact handle, returning the
    /// subject and its issued credentials.
    pub async fn lookup(&self, subject_ref: &SubjectRef) -> Result<SubjectProfile, RegistryError> {
        let subject = match subject_ref {
            SubjectRef::Id(id) => self.registry.subject(id).await?,
            SubjectRef::Contact(handle) => self.registry.subject_by_contact(handle).await?,
        };
        let credentials = self.registry.issued_credentials_for(&subject.id).await;
        Ok(SubjectProfile {
            subject,
            credentials,
        })
    }
}
