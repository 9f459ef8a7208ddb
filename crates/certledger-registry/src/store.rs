//! # Registry Store Contract and In-Memory Implementation
//!
//! [`CredentialRegistry`] is the seam between the orchestration layer
//! and durable storage. The lease operations (`begin_issuance`,
//! `begin_revocation`) are compare-and-set: they validate state and
//! move the enrollment or record into its in-flight sub-state in one
//! atomic step, so concurrent callers cannot both pass the read-check.
//!
//! [`MemoryRegistry`] realizes the CAS with a single `RwLock` over the
//! registry maps — every `begin_*`/`complete_*`/`abort_*` runs under
//! one write guard and is therefore atomic with respect to every other
//! registry operation.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use certledger_core::{
    fingerprint, ContactHandle, CourseName, CredentialId, SubjectId, Timestamp, TransactionRef,
};
use certledger_state::{
    CredentialError, CredentialRecord, CredentialStatus, Enrollment, EnrollmentError,
};

use crate::documents::{Institution, IssuanceIntent, RevocationIntent, Subject};

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors returned by registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No subject with the given id.
    #[error("subject {id} not found")]
    SubjectNotFound {
        /// The unknown subject.
        id: SubjectId,
    },

    /// No subject with the given contact handle.
    #[error("no subject with contact handle {handle}")]
    ContactNotFound {
        /// The unknown handle.
        handle: ContactHandle,
    },

    /// A subject with this id already exists.
    #[error("subject {id} already exists")]
    DuplicateSubject {
        /// The contested id.
        id: SubjectId,
    },

    /// Another subject already uses this contact handle.
    #[error("contact handle {handle} is already in use")]
    DuplicateContact {
        /// The contested handle.
        handle: ContactHandle,
    },

    /// The subject has no enrollment in the given course.
    #[error("subject {subject} is not enrolled in course {course}")]
    NotEnrolled {
        /// The subject.
        subject: SubjectId,
        /// The missing course.
        course: CourseName,
    },

    /// The subject is already enrolled in the given course.
    #[error("subject {subject} is already enrolled in course {course}")]
    AlreadyEnrolled {
        /// The subject.
        subject: SubjectId,
        /// The duplicate course.
        course: CourseName,
    },

    /// An enrollment transition was rejected.
    #[error(transparent)]
    Enrollment(#[from] EnrollmentError),

    /// A credential record transition was rejected.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// No credential record with the given id.
    #[error("credential {id} not found")]
    CredentialNotFound {
        /// The unknown credential.
        id: CredentialId,
    },

    /// No in-flight intent for the given credential id.
    #[error("no in-flight operation for credential {id}")]
    IntentNotFound {
        /// The credential without an intent.
        id: CredentialId,
    },

    /// Abort refused: the ledger has already confirmed this operation,
    /// so it must run forward to completion.
    #[error("operation for credential {id} is ledger-confirmed and can no longer be aborted")]
    LedgerConfirmed {
        /// The confirmed operation's credential.
        id: CredentialId,
    },

    /// No institution with the given identity key.
    #[error("no institution with identity key {key}")]
    InstitutionNotFound {
        /// The unknown key.
        key: String,
    },

    /// An institution with this name or identity key already exists.
    #[error("institution {name} already exists")]
    DuplicateInstitution {
        /// The contested name.
        name: String,
    },
}

// ─── Contract ────────────────────────────────────────────────────────

/// Store contract for the credential registry.
#[async_trait]
pub trait CredentialRegistry: Send + Sync {
    // -- subjects --

    /// Register a subject. Id and contact handle must be unused.
    async fn create_subject(
        &self,
        id: SubjectId,
        name: String,
        contact: Option<ContactHandle>,
    ) -> Result<Subject, RegistryError>;

    /// Load a subject by id.
    async fn subject(&self, id: &SubjectId) -> Result<Subject, RegistryError>;

    /// Load a subject by contact handle.
    async fn subject_by_contact(&self, handle: &ContactHandle) -> Result<Subject, RegistryError>;

    /// All subjects, ordered by display name.
    async fn list_subjects(&self) -> Vec<Subject>;

    /// Change a subject's display name. Does not touch issued
    /// credential records — their snapshots are immutable.
    async fn rename_subject(&self, id: &SubjectId, name: String) -> Result<Subject, RegistryError>;

    /// Change or clear a subject's contact handle, keeping the handle
    /// unique across subjects.
    async fn update_contact(
        &self,
        id: &SubjectId,
        contact: Option<ContactHandle>,
    ) -> Result<Subject, RegistryError>;

    /// Enroll a subject in a course. One enrollment per (subject,
    /// course).
    async fn enroll(&self, id: &SubjectId, course: CourseName) -> Result<Subject, RegistryError>;

    // -- issuance lease --

    /// Atomically take the issuance lease for (subject, course):
    /// validates the enrollment is in `Enrolled`, moves it to
    /// `Issuing`, snapshots the subject name, computes the
    /// fingerprint, and records the intent. Exactly one concurrent
    /// caller succeeds.
    async fn begin_issuance(
        &self,
        subject_id: &SubjectId,
        course: &CourseName,
        credential_id: CredentialId,
    ) -> Result<IssuanceIntent, RegistryError>;

    /// Persist the ledger confirmation on the in-flight intent. After
    /// this the operation can no longer be aborted.
    async fn record_ledger_commit(
        &self,
        credential_id: &CredentialId,
        transaction_ref: TransactionRef,
    ) -> Result<(), RegistryError>;

    /// Settle a successful issuance: insert the credential record and
    /// flip the enrollment to `Certified` as one durable update.
    /// Idempotent — re-settling an already-settled issuance is a
    /// no-op, which is what makes reconciliation safe to re-drive.
    async fn complete_issuance(&self, record: CredentialRecord) -> Result<(), RegistryError>;

    /// Release the issuance lease after a failure **before** ledger
    /// confirmation. Refused with [`RegistryError::LedgerConfirmed`]
    /// once a transaction reference is recorded.
    async fn abort_issuance(&self, credential_id: &CredentialId) -> Result<(), RegistryError>;

    /// All in-flight issuance intents, for the reconciliation pass.
    async fn pending_issuances(&self) -> Vec<IssuanceIntent>;

    // -- revocation lease --

    /// Atomically take the revocation lease for a credential:
    /// validates the record is `Issued`, moves it to `Revoking`, and
    /// records the intent carrying the snapshot fingerprint.
    async fn begin_revocation(
        &self,
        credential_id: &CredentialId,
    ) -> Result<RevocationIntent, RegistryError>;

    /// Mark the in-flight revocation as ledger-confirmed.
    async fn record_ledger_revoke(
        &self,
        credential_id: &CredentialId,
    ) -> Result<(), RegistryError>;

    /// Settle a confirmed revocation: flip the record and its linked
    /// enrollment to `Revoked` as one durable update. Idempotent.
    async fn complete_revocation(&self, credential_id: &CredentialId)
        -> Result<(), RegistryError>;

    /// Release the revocation lease after a failure **before** ledger
    /// confirmation.
    async fn abort_revocation(&self, credential_id: &CredentialId) -> Result<(), RegistryError>;

    /// All in-flight revocation intents, for the reconciliation pass.
    async fn pending_revocations(&self) -> Vec<RevocationIntent>;

    // -- credential queries --

    /// Load a credential record by id.
    async fn credential(&self, id: &CredentialId) -> Result<CredentialRecord, RegistryError>;

    /// The subject's credential records with status `Issued`. Revoked
    /// records are excluded from this positive listing but retained in
    /// storage.
    async fn issued_credentials_for(&self, subject_id: &SubjectId) -> Vec<CredentialRecord>;

    // -- institutions --

    /// Register an institution. Name and identity key must be unused.
    async fn create_institution(
        &self,
        name: String,
        identity_key: String,
    ) -> Result<Institution, RegistryError>;

    /// All institutions, ordered by name.
    async fn institutions(&self) -> Vec<Institution>;

    /// Load an institution by identity key.
    async fn institution_by_key(&self, key: &str) -> Result<Institution, RegistryError>;

    /// Record a confirmed minter grant on the institution.
    async fn set_minter(
        &self,
        key: &str,
        grant_ref: TransactionRef,
    ) -> Result<Institution, RegistryError>;
}

// ─── In-Memory Registry ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct RegistryInner {
    subjects: HashMap<SubjectId, Subject>,
    contact_index: HashMap<ContactHandle, SubjectId>,
    credentials: HashMap<CredentialId, CredentialRecord>,
    by_subject: HashMap<SubjectId, Vec<CredentialId>>,
    issuance_intents: HashMap<CredentialId, IssuanceIntent>,
    revocation_intents: HashMap<CredentialId, RevocationIntent>,
    institutions: HashMap<String, Institution>,
}

/// In-memory registry. One `RwLock` over the whole store; the write
/// guard is what makes the lease operations true compare-and-sets.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    inner: RwLock<RegistryInner>,
}

impl MemoryRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialRegistry for MemoryRegistry {
    async fn create_subject(
        &self,
        id: SubjectId,
        name: String,
        contact: Option<ContactHandle>,
    ) -> Result<Subject, RegistryError> {
        let mut inner = self.inner.write().await;
        if inner.subjects.contains_key(&id) {
            return Err(RegistryError::DuplicateSubject { id });
        }
        if let Some(handle) = &contact {
            if inner.contact_index.contains_key(handle) {
                return Err(RegistryError::DuplicateContact {
                    handle: handle.clone(),
                });
            }
        }
        let subject = Subject {
            id: id.clone(),
            name,
            contact: contact.clone(),
            enrollments: Vec::new(),
        };
        if let Some(handle) = contact {
            inner.contact_index.insert(handle, id.clone());
        }
        inner.subjects.insert(id, subject.clone());
        Ok(subject)
    }

    async fn subject(&self, id: &SubjectId) -> Result<Subject, RegistryError> {
        self.inner
            .read()
            .await
            .subjects
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::SubjectNotFound { id: id.clone() })
    }

    async fn subject_by_contact(&self, handle: &ContactHandle) -> Result<Subject, RegistryError> {
        let inner = self.inner.read().await;
        let id = inner
            .contact_index
            .get(handle)
            .ok_or_else(|| RegistryError::ContactNotFound {
                handle: handle.clone(),
            })?;
        inner
            .subjects
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::SubjectNotFound { id: id.clone() })
    }

    async fn list_subjects(&self) -> Vec<Subject> {
        let mut subjects: Vec<Subject> = self.inner.read().await.subjects.values().cloned().collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        subjects
    }

    async fn rename_subject(&self, id: &SubjectId, name: String) -> Result<Subject, RegistryError> {
        let mut inner = self.inner.write().await;
        let subject = inner
            .subjects
            .get_mut(id)
            .ok_or_else(|| RegistryError::SubjectNotFound { id: id.clone() })?;
        subject.name = name;
        Ok(subject.clone())
    }

    async fn update_contact(
        &self,
        id: &SubjectId,
        contact: Option<ContactHandle>,
    ) -> Result<Subject, RegistryError> {
        let mut inner = self.inner.write().await;
        if let Some(handle) = &contact {
            if let Some(owner) = inner.contact_index.get(handle) {
                if owner != id {
                    return Err(RegistryError::DuplicateContact {
                        handle: handle.clone(),
                    });
                }
            }
        }
        let subject = inner
            .subjects
            .get_mut(id)
            .ok_or_else(|| RegistryError::SubjectNotFound { id: id.clone() })?;
        let previous = subject.contact.take();
        subject.contact = contact.clone();
        let updated = subject.clone();
        if let Some(previous) = previous {
            inner.contact_index.remove(&previous);
        }
        if let Some(handle) = contact {
            inner.contact_index.insert(handle, id.clone());
        }
        Ok(updated)
    }

    async fn enroll(&self, id: &SubjectId, course: CourseName) -> Result<Subject, RegistryError> {
        let mut inner = self.inner.write().await;
        let subject = inner
            .subjects
            .get_mut(id)
            .ok_or_else(|| RegistryError::SubjectNotFound { id: id.clone() })?;
        if subject.enrollment(&course).is_some() {
            return Err(RegistryError::AlreadyEnrolled {
                subject: id.clone(),
                course,
            });
        }
        subject.enrollments.push(Enrollment::new(course));
        Ok(subject.clone())
    }

    async fn begin_issuance(
        &self,
        subject_id: &SubjectId,
        course: &CourseName,
        credential_id: CredentialId,
    ) -> Result<IssuanceIntent, RegistryError> {
        let mut inner = self.inner.write().await;
        let subject = inner
            .subjects
            .get_mut(subject_id)
            .ok_or_else(|| RegistryError::SubjectNotFound {
                id: subject_id.clone(),
            })?;
        let subject_name = subject.name.clone();
        let enrollment =
            subject
                .enrollment_mut(course)
                .ok_or_else(|| RegistryError::NotEnrolled {
                    subject: subject_id.clone(),
                    course: course.clone(),
                })?;
        enrollment.begin_issuance()?;

        // Snapshot and fingerprint are taken under the same write
        // guard as the CAS, so a concurrent rename cannot split them.
        let intent = IssuanceIntent {
            credential_id,
            subject_id: subject_id.clone(),
            subject_name: subject_name.clone(),
            course: course.clone(),
            fingerprint: fingerprint(&subject_name, subject_id, course),
            transaction_ref: None,
            started_at: Timestamp::now(),
        };
        inner.issuance_intents.insert(credential_id, intent.clone());
        Ok(intent)
    }

    async fn record_ledger_commit(
        &self,
        credential_id: &CredentialId,
        transaction_ref: TransactionRef,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().await;
        let intent = inner
            .issuance_intents
            .get_mut(credential_id)
            .ok_or(RegistryError::IntentNotFound { id: *credential_id })?;
        intent.transaction_ref = Some(transaction_ref);
        Ok(())
    }

    async fn complete_issuance(&self, record: CredentialRecord) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().await;
        let credential_id = record.id;
        if inner.credentials.contains_key(&credential_id) {
            inner.issuance_intents.remove(&credential_id);
            return Ok(());
        }
        let subject = inner
            .subjects
            .get_mut(&record.subject_id)
            .ok_or_else(|| RegistryError::SubjectNotFound {
                id: record.subject_id.clone(),
            })?;
        let enrollment =
            subject
                .enrollment_mut(&record.course)
                .ok_or_else(|| RegistryError::NotEnrolled {
                    subject: record.subject_id.clone(),
                    course: record.course.clone(),
                })?;
        enrollment.certify(credential_id)?;
        inner
            .by_subject
            .entry(record.subject_id.clone())
            .or_default()
            .push(credential_id);
        inner.credentials.insert(credential_id, record);
        inner.issuance_intents.remove(&credential_id);
        Ok(())
    }

    async fn abort_issuance(&self, credential_id: &CredentialId) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().await;
        let intent = inner
            .issuance_intents
            .get(credential_id)
            .ok_or(RegistryError::IntentNotFound { id: *credential_id })?;
        if intent.transaction_ref.is_some() {
            return Err(RegistryError::LedgerConfirmed { id: *credential_id });
        }
        let subject_id = intent.subject_id.clone();
        let course = intent.course.clone();
        if let Some(subject) = inner.subjects.get_mut(&subject_id) {
            if let Some(enrollment) = subject.enrollment_mut(&course) {
                enrollment.release()?;
            }
        }
        inner.issuance_intents.remove(credential_id);
        Ok(())
    }

    async fn pending_issuances(&self) -> Vec<IssuanceIntent> {
        self.inner
            .read()
            .await
            .issuance_intents
            .values()
            .cloned()
            .collect()
    }

    async fn begin_revocation(
        &self,
        credential_id: &CredentialId,
    ) -> Result<RevocationIntent, RegistryError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .credentials
            .get_mut(credential_id)
            .ok_or(RegistryError::CredentialNotFound { id: *credential_id })?;
        record.begin_revocation()?;
        let intent = RevocationIntent {
            credential_id: *credential_id,
            fingerprint: record.fingerprint,
            ledger_confirmed: false,
            started_at: Timestamp::now(),
        };
        inner
            .revocation_intents
            .insert(*credential_id, intent.clone());
        Ok(intent)
    }

    async fn record_ledger_revoke(
        &self,
        credential_id: &CredentialId,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().await;
        let intent = inner
            .revocation_intents
            .get_mut(credential_id)
            .ok_or(RegistryError::IntentNotFound { id: *credential_id })?;
        intent.ledger_confirmed = true;
        Ok(())
    }

    async fn complete_revocation(
        &self,
        credential_id: &CredentialId,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .credentials
            .get_mut(credential_id)
            .ok_or(RegistryError::CredentialNotFound { id: *credential_id })?;
        if record.status == CredentialStatus::Revoked {
            inner.revocation_intents.remove(credential_id);
            return Ok(());
        }
        record.complete_revocation()?;
        let subject_id = record.subject_id.clone();
        let course = record.course.clone();
        if let Some(subject) = inner.subjects.get_mut(&subject_id) {
            if let Some(enrollment) = subject.enrollment_mut(&course) {
                enrollment.revoke()?;
            }
        }
        inner.revocation_intents.remove(credential_id);
        Ok(())
    }

    async fn abort_revocation(&self, credential_id: &CredentialId) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().await;
        let intent = inner
            .revocation_intents
            .get(credential_id)
            .ok_or(RegistryError::IntentNotFound { id: *credential_id })?;
        if intent.ledger_confirmed {
            return Err(RegistryError::LedgerConfirmed { id: *credential_id });
        }
        if let Some(record) = inner.credentials.get_mut(credential_id) {
            record.release_revocation()?;
        }
        inner.revocation_intents.remove(credential_id);
        Ok(())
    }

    async fn pending_revocations(&self) -> Vec<RevocationIntent> {
        self.inner
            .read()
            .await
            .revocation_intents
            .values()
            .cloned()
            .collect()
    }

    async fn credential(&self, id: &CredentialId) -> Result<CredentialRecord, RegistryError> {
        self.inner
            .read()
            .await
            .credentials
            .get(id)
            .cloned()
            .ok_or(RegistryError::CredentialNotFound { id: *id })
    }

    async fn issued_credentials_for(&self, subject_id: &SubjectId) -> Vec<CredentialRecord> {
        let inner = self.inner.read().await;
        inner
            .by_subject
            .get(subject_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.credentials.get(id))
                    .filter(|r| r.status == CredentialStatus::Issued)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn create_institution(
        &self,
        name: String,
        identity_key: String,
    ) -> Result<Institution, RegistryError> {
        let mut inner = self.inner.write().await;
        let duplicate = inner.institutions.contains_key(&name)
            || inner
                .institutions
                .values()
                .any(|i| i.identity_key == identity_key);
        if duplicate {
            return Err(RegistryError::DuplicateInstitution { name });
        }
        let institution = Institution {
            name: name.clone(),
            identity_key,
            is_minter: false,
            grant_ref: None,
        };
        inner.institutions.insert(name, institution.clone());
        Ok(institution)
    }

    async fn institutions(&self) -> Vec<Institution> {
        let mut institutions: Vec<Institution> =
            self.inner.read().await.institutions.values().cloned().collect();
        institutions.sort_by(|a, b| a.name.cmp(&b.name));
        institutions
    }

    async fn institution_by_key(&self, key: &str) -> Result<Institution, RegistryError> {
        self.inner
            .read()
            .await
            .institutions
            .values()
            .find(|i| i.identity_key == key)
            .cloned()
            .ok_or_else(|| RegistryError::InstitutionNotFound {
                key: key.to_string(),
            })
    }

    async fn set_minter(
        &self,
        key: &str,
        grant_ref: TransactionRef,
    ) -> Result<Institution, RegistryError> {
        let mut inner = self.inner.write().await;
        let institution = inner
            .institutions
            .values_mut()
            .find(|i| i.identity_key == key)
            .ok_or_else(|| RegistryError::InstitutionNotFound {
                key: key.to_string(),
            })?;
        institution.is_minter = true;
        institution.grant_ref = Some(grant_ref);
        Ok(institution.clone())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use certledger_state::EnrollmentStatus;

    fn subject_id(s: &str) -> SubjectId {
        SubjectId::new(s).unwrap()
    }

    fn course(s: &str) -> CourseName {
        CourseName::new(s).unwrap()
    }

    fn contact(s: &str) -> ContactHandle {
        ContactHandle::new(s).unwrap()
    }

    async fn registry_with_enrollment() -> MemoryRegistry {
        let registry = MemoryRegistry::new();
        registry
            .create_subject(
                subject_id("2001"),
                "Aarav Sharma".to_string(),
                Some(contact("aarav@example.com")),
            )
            .await
            .unwrap();
        registry
            .enroll(&subject_id("2001"), course("Wood Carving"))
            .await
            .unwrap();
        registry
    }

    fn settled_record(intent: &IssuanceIntent) -> CredentialRecord {
        CredentialRecord::issued(
            intent.credential_id,
            intent.subject_id.clone(),
            intent.subject_name.clone(),
            intent.course.clone(),
            intent.fingerprint,
            TransactionRef("anchor-tx-00000001".to_string()),
            certledger_core::ContentAddress("ab12".to_string()),
        )
    }

    // ── Subjects ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_duplicate_subject_rejected() {
        let registry = registry_with_enrollment().await;
        assert!(matches!(
            registry
                .create_subject(subject_id("2001"), "Other".to_string(), None)
                .await,
            Err(RegistryError::DuplicateSubject { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_contact_rejected() {
        let registry = registry_with_enrollment().await;
        assert!(matches!(
            registry
                .create_subject(
                    subject_id("2002"),
                    "Vivaan Verma".to_string(),
                    Some(contact("aarav@example.com")),
                )
                .await,
            Err(RegistryError::DuplicateContact { .. })
        ));
    }

    #[tokio::test]
    async fn test_lookup_by_contact() {
        let registry = registry_with_enrollment().await;
        let subject = registry
            .subject_by_contact(&contact("aarav@example.com"))
            .await
            .unwrap();
        assert_eq!(subject.id, subject_id("2001"));
        assert!(matches!(
            registry.subject_by_contact(&contact("nobody@example.com")).await,
            Err(RegistryError::ContactNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_subjects_sorted_by_name() {
        let registry = registry_with_enrollment().await;
        registry
            .create_subject(subject_id("2002"), "Vivaan Verma".to_string(), None)
            .await
            .unwrap();
        registry
            .create_subject(subject_id("2003"), "Ananya Gupta".to_string(), None)
            .await
            .unwrap();
        let names: Vec<String> = registry
            .list_subjects()
            .await
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Aarav Sharma", "Ananya Gupta", "Vivaan Verma"]);
    }

    #[tokio::test]
    async fn test_update_contact_moves_index() {
        let registry = registry_with_enrollment().await;
        registry
            .update_contact(&subject_id("2001"), Some(contact("aarav@new.example.com")))
            .await
            .unwrap();
        assert!(registry
            .subject_by_contact(&contact("aarav@example.com"))
            .await
            .is_err());
        let subject = registry
            .subject_by_contact(&contact("aarav@new.example.com"))
            .await
            .unwrap();
        assert_eq!(subject.id, subject_id("2001"));

        // Clearing frees the handle for another subject.
        registry
            .update_contact(&subject_id("2001"), None)
            .await
            .unwrap();
        registry
            .create_subject(
                subject_id("2002"),
                "Vivaan Verma".to_string(),
                Some(contact("aarav@new.example.com")),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_contact_rejects_taken_handle() {
        let registry = registry_with_enrollment().await;
        registry
            .create_subject(
                subject_id("2002"),
                "Vivaan Verma".to_string(),
                Some(contact("vivaan@example.com")),
            )
            .await
            .unwrap();
        assert!(matches!(
            registry
                .update_contact(&subject_id("2002"), Some(contact("aarav@example.com")))
                .await,
            Err(RegistryError::DuplicateContact { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_enrollment_rejected() {
        let registry = registry_with_enrollment().await;
        assert!(matches!(
            registry
                .enroll(&subject_id("2001"), course("Wood Carving"))
                .await,
            Err(RegistryError::AlreadyEnrolled { .. })
        ));
    }

    #[tokio::test]
    async fn test_enroll_unknown_subject_rejected() {
        let registry = MemoryRegistry::new();
        assert!(matches!(
            registry.enroll(&subject_id("9999"), course("X")).await,
            Err(RegistryError::SubjectNotFound { .. })
        ));
    }

    // ── Issuance lease ───────────────────────────────────────────────

    #[tokio::test]
    async fn test_begin_issuance_takes_lease_and_snapshots() {
        let registry = registry_with_enrollment().await;
        let id = CredentialId::generate();
        let intent = registry
            .begin_issuance(&subject_id("2001"), &course("Wood Carving"), id)
            .await
            .unwrap();
        assert_eq!(intent.subject_name, "Aarav Sharma");
        assert!(intent.transaction_ref.is_none());

        let subject = registry.subject(&subject_id("2001")).await.unwrap();
        assert_eq!(
            subject.enrollment(&course("Wood Carving")).unwrap().status,
            EnrollmentStatus::Issuing
        );
    }

    #[tokio::test]
    async fn test_second_lease_fails_in_progress() {
        let registry = registry_with_enrollment().await;
        registry
            .begin_issuance(
                &subject_id("2001"),
                &course("Wood Carving"),
                CredentialId::generate(),
            )
            .await
            .unwrap();
        let err = registry
            .begin_issuance(
                &subject_id("2001"),
                &course("Wood Carving"),
                CredentialId::generate(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Enrollment(EnrollmentError::IssuanceInProgress { .. })
        ));
    }

    #[tokio::test]
    async fn test_complete_issuance_settles_and_is_idempotent() {
        let registry = registry_with_enrollment().await;
        let id = CredentialId::generate();
        let intent = registry
            .begin_issuance(&subject_id("2001"), &course("Wood Carving"), id)
            .await
            .unwrap();
        let record = settled_record(&intent);
        registry.complete_issuance(record.clone()).await.unwrap();

        let subject = registry.subject(&subject_id("2001")).await.unwrap();
        let enrollment = subject.enrollment(&course("Wood Carving")).unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Certified);
        assert_eq!(enrollment.credential, Some(id));
        assert!(registry.pending_issuances().await.is_empty());

        // Re-settling the same issuance is a no-op.
        registry.complete_issuance(record).await.unwrap();
        assert_eq!(registry.issued_credentials_for(&subject_id("2001")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_abort_releases_lease() {
        let registry = registry_with_enrollment().await;
        let id = CredentialId::generate();
        registry
            .begin_issuance(&subject_id("2001"), &course("Wood Carving"), id)
            .await
            .unwrap();
        registry.abort_issuance(&id).await.unwrap();

        let subject = registry.subject(&subject_id("2001")).await.unwrap();
        assert_eq!(
            subject.enrollment(&course("Wood Carving")).unwrap().status,
            EnrollmentStatus::Enrolled
        );
        assert!(registry.pending_issuances().await.is_empty());
    }

    #[tokio::test]
    async fn test_abort_refused_after_ledger_confirmation() {
        let registry = registry_with_enrollment().await;
        let id = CredentialId::generate();
        registry
            .begin_issuance(&subject_id("2001"), &course("Wood Carving"), id)
            .await
            .unwrap();
        registry
            .record_ledger_commit(&id, TransactionRef("anchor-tx-00000001".to_string()))
            .await
            .unwrap();
        assert!(matches!(
            registry.abort_issuance(&id).await,
            Err(RegistryError::LedgerConfirmed { .. })
        ));
        // The intent survives for the reconciliation pass.
        assert_eq!(registry.pending_issuances().await.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_taken_at_lease_survives_rename() {
        let registry = registry_with_enrollment().await;
        let id = CredentialId::generate();
        let intent = registry
            .begin_issuance(&subject_id("2001"), &course("Wood Carving"), id)
            .await
            .unwrap();
        registry
            .rename_subject(&subject_id("2001"), "Aarav S.".to_string())
            .await
            .unwrap();
        // The intent keeps the lease-time snapshot.
        assert_eq!(intent.subject_name, "Aarav Sharma");
        let pending = registry.pending_issuances().await;
        assert_eq!(pending[0].subject_name, "Aarav Sharma");
    }

    // ── Revocation lease ─────────────────────────────────────────────

    async fn registry_with_issued() -> (MemoryRegistry, CredentialId) {
        let registry = registry_with_enrollment().await;
        let id = CredentialId::generate();
        let intent = registry
            .begin_issuance(&subject_id("2001"), &course("Wood Carving"), id)
            .await
            .unwrap();
        registry.complete_issuance(settled_record(&intent)).await.unwrap();
        (registry, id)
    }

    #[tokio::test]
    async fn test_revocation_lifecycle() {
        let (registry, id) = registry_with_issued().await;
        let intent = registry.begin_revocation(&id).await.unwrap();
        assert!(!intent.ledger_confirmed);
        registry.record_ledger_revoke(&id).await.unwrap();
        registry.complete_revocation(&id).await.unwrap();

        let record = registry.credential(&id).await.unwrap();
        assert_eq!(record.status, CredentialStatus::Revoked);
        let subject = registry.subject(&subject_id("2001")).await.unwrap();
        assert_eq!(
            subject.enrollment(&course("Wood Carving")).unwrap().status,
            EnrollmentStatus::Revoked
        );
        // Revoked records vanish from the positive listing.
        assert!(registry.issued_credentials_for(&subject_id("2001")).await.is_empty());
        assert!(registry.pending_revocations().await.is_empty());
    }

    #[tokio::test]
    async fn test_second_revocation_lease_fails() {
        let (registry, id) = registry_with_issued().await;
        registry.begin_revocation(&id).await.unwrap();
        assert!(matches!(
            registry.begin_revocation(&id).await,
            Err(RegistryError::Credential(
                CredentialError::RevocationInProgress { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_revocation_abort_refused_after_confirmation() {
        let (registry, id) = registry_with_issued().await;
        registry.begin_revocation(&id).await.unwrap();
        registry.record_ledger_revoke(&id).await.unwrap();
        assert!(matches!(
            registry.abort_revocation(&id).await,
            Err(RegistryError::LedgerConfirmed { .. })
        ));
    }

    #[tokio::test]
    async fn test_revocation_abort_releases_record() {
        let (registry, id) = registry_with_issued().await;
        registry.begin_revocation(&id).await.unwrap();
        registry.abort_revocation(&id).await.unwrap();
        let record = registry.credential(&id).await.unwrap();
        assert_eq!(record.status, CredentialStatus::Issued);
    }

    // ── Institutions ─────────────────────────────────────────────────

    #[tokio::test]
    async fn test_institution_uniqueness() {
        let registry = MemoryRegistry::new();
        registry
            .create_institution("NCVET".to_string(), "key-1".to_string())
            .await
            .unwrap();
        assert!(matches!(
            registry
                .create_institution("NCVET".to_string(), "key-2".to_string())
                .await,
            Err(RegistryError::DuplicateInstitution { .. })
        ));
        assert!(matches!(
            registry
                .create_institution("Other".to_string(), "key-1".to_string())
                .await,
            Err(RegistryError::DuplicateInstitution { .. })
        ));
    }

    #[tokio::test]
    async fn test_set_minter_records_grant() {
        let registry = MemoryRegistry::new();
        registry
            .create_institution("NCVET".to_string(), "key-1".to_string())
            .await
            .unwrap();
        let granted = registry
            .set_minter("key-1", TransactionRef("anchor-tx-00000007".to_string()))
            .await
            .unwrap();
        assert!(granted.is_minter);
        assert!(granted.grant_ref.is_some());
        let loaded = registry.institution_by_key("key-1").await.unwrap();
        assert!(loaded.is_minter);
    }
}
