//! # Issuance Orchestration
//!
//! Drives the issue and revoke workflows across the three stores,
//! enforcing ordering and idempotency:
//!
//! 1. **Lease** — an atomic compare-and-set in the registry moves the
//!    enrollment (or record) into its in-flight sub-state. Losers of
//!    the race fail fast; nothing external has been touched.
//! 2. **Ledger** — the commitment/revocation is submitted and awaited
//!    to finality. On failure the lease is released and the caller may
//!    retry; nothing durable happened.
//! 3. **Settle** — once the ledger confirmed, the remaining steps
//!    (render, archive put, registry update) are driven forward with
//!    bounded in-line retries, and on exhaustion the in-flight intent
//!    is left for [`IssuanceOrchestrator::reconcile`]. They are never
//!    rolled back: the ledger cannot un-commit.
//!
//! Re-driving a settle is safe end to end: rendering is deterministic,
//! archive puts are content-addressed (identical bytes, identical
//! address, no-op), and the registry settlement is an idempotent
//! status-set.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use certledger_anchor::VerificationLedger;
use certledger_archive::ContentArchive;
use certledger_core::{CourseName, CredentialId, SubjectId, Timestamp, TransactionRef};
use certledger_registry::{
    CredentialRegistry, Institution, IssuanceIntent, RevocationIntent,
};
use certledger_state::CredentialRecord;

use crate::error::{AdminError, IssueError, RevokeError};
use crate::render::{CredentialRenderer, RenderRequest};

/// Default in-line retries for the post-commit archive put.
const DEFAULT_ARCHIVE_RETRIES: u32 = 2;

/// Default age an in-flight intent must reach before reconciliation
/// touches it, so the pass cannot race an operation that is still
/// actively running.
const DEFAULT_RECONCILE_GRACE: Duration = Duration::from_secs(60);

/// The result of a successful issuance.
#[derive(Debug, Clone, Serialize)]
pub struct IssueOutcome {
    /// The newly issued credential.
    pub credential_id: CredentialId,
    /// Resolvable link to the archived credential document.
    pub content_link: String,
}

/// Counters from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Issuances settled (ledger had committed).
    pub completed_issuances: usize,
    /// Issuance leases released (ledger had not committed).
    pub released_issuances: usize,
    /// Revocations settled.
    pub completed_revocations: usize,
    /// Revocation leases released.
    pub released_revocations: usize,
    /// Intents younger than the grace period, left alone.
    pub skipped: usize,
    /// Intents whose reconciliation failed; retried next pass.
    pub failed: usize,
}

/// Orchestrates issuance and revocation across the registry, the
/// verification ledger, and the content archive.
///
/// All clients are injected at construction; lifecycle is owned by the
/// process entry point, which makes substituting fakes in tests
/// trivial.
pub struct IssuanceOrchestrator {
    registry: Arc<dyn CredentialRegistry>,
    ledger: Arc<dyn VerificationLedger>,
    archive: Arc<dyn ContentArchive>,
    renderer: Arc<dyn CredentialRenderer>,
    archive_retries: u32,
    reconcile_grace: Duration,
}

impl IssuanceOrchestrator {
    /// Construct an orchestrator over the injected clients.
    pub fn new(
        registry: Arc<dyn CredentialRegistry>,
        ledger: Arc<dyn VerificationLedger>,
        archive: Arc<dyn ContentArchive>,
        renderer: Arc<dyn CredentialRenderer>,
    ) -> Self {
        Self {
            registry,
            ledger,
            archive,
            renderer,
            archive_retries: DEFAULT_ARCHIVE_RETRIES,
            reconcile_grace: DEFAULT_RECONCILE_GRACE,
        }
    }

    /// Override the reconciliation grace period (tests use zero).
    pub fn with_reconcile_grace(mut self, grace: Duration) -> Self {
        self.reconcile_grace = grace;
        self
    }

    /// Override the bounded in-line retry count for archive puts.
    pub fn with_archive_retries(mut self, retries: u32) -> Self {
        self.archive_retries = retries;
        self
    }

    // ─── Issue ───────────────────────────────────────────────────────

    /// Issue a credential for (subject, course).
    ///
    /// Once the ledger commit has confirmed, this call never abandons
    /// the operation: either it settles and returns the credential, or
    /// it returns [`IssueError::RecoverableInconsistency`] and leaves
    /// the intent for reconciliation. Callers must not retry in the
    /// latter case.
    pub async fn issue(
        &self,
        subject_id: &SubjectId,
        course: &CourseName,
    ) -> Result<IssueOutcome, IssueError> {
        let credential_id = CredentialId::generate();
        let intent = self
            .registry
            .begin_issuance(subject_id, course, credential_id)
            .await?;
        tracing::info!(
            credential = %credential_id,
            subject = %subject_id,
            course = %course,
            "issuance lease acquired"
        );

        let transaction_ref = match self.ledger.commit(&intent.fingerprint).await {
            Ok(tx) => tx,
            Err(e) => {
                tracing::warn!(
                    credential = %credential_id,
                    error = %e,
                    "ledger commit failed; releasing issuance lease"
                );
                if let Err(release) = self.registry.abort_issuance(&credential_id).await {
                    tracing::error!(
                        credential = %credential_id,
                        error = %release,
                        "failed to release issuance lease"
                    );
                }
                metrics::counter!("certledger_issuance_failures_total").increment(1);
                return Err(IssueError::Ledger(e));
            }
        };

        if let Err(e) = self
            .registry
            .record_ledger_commit(&credential_id, transaction_ref.clone())
            .await
        {
            // The commit is final but its confirmation was not
            // persisted; reconciliation resolves the intent through
            // commitment_of().
            tracing::error!(
                credential = %credential_id,
                error = %e,
                "ledger commit confirmed but confirmation not recorded"
            );
            metrics::counter!("certledger_recoverable_inconsistencies_total").increment(1);
            return Err(IssueError::RecoverableInconsistency {
                id: credential_id,
                cause: format!("recording ledger confirmation: {e}"),
            });
        }

        match self.settle_issuance(&intent, transaction_ref).await {
            Ok(content_link) => {
                metrics::counter!("certledger_credentials_issued_total").increment(1);
                tracing::info!(credential = %credential_id, "credential issued");
                Ok(IssueOutcome {
                    credential_id,
                    content_link,
                })
            }
            Err(cause) => {
                metrics::counter!("certledger_recoverable_inconsistencies_total").increment(1);
                tracing::warn!(
                    credential = %credential_id,
                    cause = %cause,
                    "issuance unsettled after ledger commit"
                );
                Err(IssueError::RecoverableInconsistency {
                    id: credential_id,
                    cause,
                })
            }
        }
    }

    /// Drive the post-commit steps: render, archive, settle the
    /// registry. Every step is safe to re-run.
    async fn settle_issuance(
        &self,
        intent: &IssuanceIntent,
        transaction_ref: TransactionRef,
    ) -> Result<String, String> {
        let bytes = self
            .renderer
            .render(&RenderRequest {
                credential_id: intent.credential_id,
                subject_name: &intent.subject_name,
                course: &intent.course,
            })
            .map_err(|e| format!("render: {e}"))?;

        let mut attempts = 0;
        let content_address = loop {
            match self.archive.put(&bytes).await {
                Ok(address) => break address,
                Err(e) if attempts < self.archive_retries => {
                    attempts += 1;
                    tracing::warn!(
                        credential = %intent.credential_id,
                        error = %e,
                        attempt = attempts,
                        "archive put failed; retrying"
                    );
                }
                Err(e) => return Err(format!("archive put: {e}")),
            }
        };

        let content_link = self
            .archive
            .resolve(&content_address)
            .await
            .map_err(|e| format!("archive resolve: {e}"))?;

        let record = CredentialRecord::issued(
            intent.credential_id,
            intent.subject_id.clone(),
            intent.subject_name.clone(),
            intent.course.clone(),
            intent.fingerprint,
            transaction_ref,
            content_address,
        );
        self.registry
            .complete_issuance(record)
            .await
            .map_err(|e| format!("registry settle: {e}"))?;
        Ok(content_link)
    }

    // ─── Revoke ──────────────────────────────────────────────────────

    /// Revoke an issued credential.
    ///
    /// The fingerprint sent to the ledger comes from the record's
    /// issuance-time snapshot, never from live subject data.
    pub async fn revoke(&self, credential_id: &CredentialId) -> Result<(), RevokeError> {
        let intent = self.registry.begin_revocation(credential_id).await?;
        tracing::info!(credential = %credential_id, "revocation lease acquired");

        if let Err(e) = self.ledger.revoke(&intent.fingerprint).await {
            tracing::warn!(
                credential = %credential_id,
                error = %e,
                "ledger revoke failed; releasing revocation lease"
            );
            if let Err(release) = self.registry.abort_revocation(credential_id).await {
                tracing::error!(
                    credential = %credential_id,
                    error = %release,
                    "failed to release revocation lease"
                );
            }
            metrics::counter!("certledger_revocation_failures_total").increment(1);
            return Err(RevokeError::Ledger(e));
        }

        if let Err(e) = self.registry.record_ledger_revoke(credential_id).await {
            metrics::counter!("certledger_recoverable_inconsistencies_total").increment(1);
            return Err(RevokeError::RecoverableInconsistency {
                id: *credential_id,
                cause: format!("recording ledger confirmation: {e}"),
            });
        }

        if let Err(e) = self.registry.complete_revocation(credential_id).await {
            metrics::counter!("certledger_recoverable_inconsistencies_total").increment(1);
            tracing::warn!(
                credential = %credential_id,
                error = %e,
                "revocation unsettled after ledger confirmation"
            );
            return Err(RevokeError::RecoverableInconsistency {
                id: *credential_id,
                cause: format!("registry settle: {e}"),
            });
        }

        metrics::counter!("certledger_credentials_revoked_total").increment(1);
        tracing::info!(credential = %credential_id, "credential revoked");
        Ok(())
    }

    // ─── Reconciliation ──────────────────────────────────────────────

    /// Re-drive every in-flight operation old enough to be presumed
    /// interrupted.
    ///
    /// Idempotent and safe to run at any time: intents whose ledger
    /// call confirmed are settled forward, intents whose ledger call
    /// never landed are released. Failures are retried on the next
    /// pass.
    pub async fn reconcile(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for intent in self.registry.pending_issuances().await {
            if self.within_grace(&intent.started_at) {
                report.skipped += 1;
                continue;
            }
            match self.reconcile_issuance(&intent).await {
                Ok(true) => report.completed_issuances += 1,
                Ok(false) => report.released_issuances += 1,
                Err(e) => {
                    tracing::warn!(
                        credential = %intent.credential_id,
                        error = %e,
                        "issuance reconciliation failed; will retry"
                    );
                    report.failed += 1;
                }
            }
        }

        for intent in self.registry.pending_revocations().await {
            if self.within_grace(&intent.started_at) {
                report.skipped += 1;
                continue;
            }
            match self.reconcile_revocation(&intent).await {
                Ok(true) => report.completed_revocations += 1,
                Ok(false) => report.released_revocations += 1,
                Err(e) => {
                    tracing::warn!(
                        credential = %intent.credential_id,
                        error = %e,
                        "revocation reconciliation failed; will retry"
                    );
                    report.failed += 1;
                }
            }
        }

        if report != ReconcileReport::default() {
            tracing::info!(?report, "reconciliation pass finished");
        }
        report
    }

    async fn reconcile_issuance(&self, intent: &IssuanceIntent) -> Result<bool, String> {
        let transaction_ref = match &intent.transaction_ref {
            Some(tx) => Some(tx.clone()),
            // Confirmation was lost in flight; ask the ledger whether
            // the commit landed.
            None => self
                .ledger
                .commitment_of(&intent.fingerprint)
                .await
                .map_err(|e| format!("ledger lookup: {e}"))?,
        };

        match transaction_ref {
            Some(tx) => {
                if intent.transaction_ref.is_none() {
                    self.registry
                        .record_ledger_commit(&intent.credential_id, tx.clone())
                        .await
                        .map_err(|e| format!("recording ledger confirmation: {e}"))?;
                }
                self.settle_issuance(intent, tx).await?;
                metrics::counter!("certledger_reconciled_issuances_total").increment(1);
                tracing::info!(credential = %intent.credential_id, "reconciliation settled issuance");
                Ok(true)
            }
            None => {
                self.registry
                    .abort_issuance(&intent.credential_id)
                    .await
                    .map_err(|e| format!("releasing lease: {e}"))?;
                tracing::info!(
                    credential = %intent.credential_id,
                    "reconciliation released uncommitted issuance"
                );
                Ok(false)
            }
        }
    }

    async fn reconcile_revocation(&self, intent: &RevocationIntent) -> Result<bool, String> {
        let confirmed = if intent.ledger_confirmed {
            true
        } else {
            // A record under revocation necessarily has a committed
            // fingerprint, so "not valid" can only mean the revocation
            // landed.
            !self
                .ledger
                .is_valid(&intent.fingerprint)
                .await
                .map_err(|e| format!("ledger lookup: {e}"))?
        };

        if confirmed {
            if !intent.ledger_confirmed {
                self.registry
                    .record_ledger_revoke(&intent.credential_id)
                    .await
                    .map_err(|e| format!("recording ledger confirmation: {e}"))?;
            }
            self.registry
                .complete_revocation(&intent.credential_id)
                .await
                .map_err(|e| format!("registry settle: {e}"))?;
            metrics::counter!("certledger_reconciled_revocations_total").increment(1);
            tracing::info!(credential = %intent.credential_id, "reconciliation settled revocation");
            Ok(true)
        } else {
            self.registry
                .abort_revocation(&intent.credential_id)
                .await
                .map_err(|e| format!("releasing lease: {e}"))?;
            tracing::info!(
                credential = %intent.credential_id,
                "reconciliation released unconfirmed revocation"
            );
            Ok(false)
        }
    }

    fn within_grace(&self, started_at: &Timestamp) -> bool {
        let age = Timestamp::now()
            .as_datetime()
            .signed_duration_since(*started_at.as_datetime());
        age.num_seconds() < self.reconcile_grace.as_secs() as i64
    }

    // ─── Institutions ────────────────────────────────────────────────

    /// Grant minter rights to an institution: ledger first, registry
    /// second, same discipline as issuance.
    pub async fn grant_minter(&self, identity_key: &str) -> Result<Institution, AdminError> {
        let institution = self.registry.institution_by_key(identity_key).await?;
        if institution.is_minter {
            return Err(AdminError::AlreadyMinter {
                name: institution.name,
            });
        }
        let grant_ref = self.ledger.grant_minter(identity_key).await?;
        let updated = self.registry.set_minter(identity_key, grant_ref).await?;
        metrics::counter!("certledger_minter_grants_total").increment(1);
        tracing::info!(institution = %updated.name, "minter rights granted");
        Ok(updated)
    }
}
