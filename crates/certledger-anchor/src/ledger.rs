//! # Verification Ledger Contract and In-Process Implementation
//!
//! ## Contract
//!
//! - `commit` records a fingerprint as valid; rejected if already
//!   committed. Callers are expected to consult registry state first so
//!   redundant commits never reach the ledger, but the ledger remains
//!   the source of truth for current validity.
//! - `revoke` is one-way: a revoked fingerprint can never return to
//!   valid.
//! - `is_valid` reflects the latest finalized state.
//! - `commitment_of` is the read-only lookup the reconciliation pass
//!   uses to resolve an issuance whose commit confirmation was lost in
//!   flight.
//! - `grant_minter` is the administrative mutation backing institution
//!   minter rights; it follows the same confirm-then-record discipline
//!   as `commit`.
//!
//! All operations return only after finality; all can independently
//! fail `Unavailable`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use certledger_core::{Fingerprint, TransactionRef};

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors returned by verification ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The fingerprint already has a commitment.
    #[error("fingerprint {fingerprint} is already committed")]
    AlreadyCommitted {
        /// The duplicate fingerprint.
        fingerprint: Fingerprint,
    },

    /// The fingerprint has no commitment to revoke.
    #[error("fingerprint {fingerprint} is not committed")]
    NotCommitted {
        /// The unknown fingerprint.
        fingerprint: Fingerprint,
    },

    /// The fingerprint's commitment is already revoked.
    #[error("fingerprint {fingerprint} is already revoked")]
    AlreadyRevoked {
        /// The revoked fingerprint.
        fingerprint: Fingerprint,
    },

    /// The ledger is unreachable or timed out. Retryable.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

// ─── Contract ────────────────────────────────────────────────────────

/// Client contract for the append-only verification ledger.
///
/// Implementations must be shareable across request handlers; every
/// method blocks until the ledger confirms finality.
#[async_trait]
pub trait VerificationLedger: Send + Sync {
    /// Commit a fingerprint, returning the finalized transaction
    /// reference.
    async fn commit(&self, fp: &Fingerprint) -> Result<TransactionRef, LedgerError>;

    /// Revoke a committed fingerprint, returning the finalized
    /// transaction reference. One-way.
    async fn revoke(&self, fp: &Fingerprint) -> Result<TransactionRef, LedgerError>;

    /// Whether the fingerprint is currently valid (committed and not
    /// revoked).
    async fn is_valid(&self, fp: &Fingerprint) -> Result<bool, LedgerError>;

    /// The transaction reference of the fingerprint's commitment, if
    /// one was ever recorded (revoked commitments still resolve).
    async fn commitment_of(&self, fp: &Fingerprint)
        -> Result<Option<TransactionRef>, LedgerError>;

    /// Grant minter rights to the given identity key.
    async fn grant_minter(&self, identity_key: &str) -> Result<TransactionRef, LedgerError>;
}

// ─── In-Process Ledger ───────────────────────────────────────────────

/// The recorded state of one fingerprint commitment.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Commitment {
    transaction_ref: TransactionRef,
    valid: bool,
}

#[derive(Debug, Default)]
struct LedgerState {
    commitments: HashMap<Fingerprint, Commitment>,
    minters: Vec<String>,
    sequence: u64,
    fail_commits: u32,
    fail_revokes: u32,
    validity_queries: u64,
}

impl LedgerState {
    fn next_ref(&mut self) -> TransactionRef {
        self.sequence += 1;
        TransactionRef(format!("anchor-tx-{:08}", self.sequence))
    }
}

/// Deterministic in-memory ledger for development and tests.
///
/// Enforces the contract exactly — double commits and revocations of
/// unknown or already-revoked fingerprints are rejected — and supports
/// fault injection so orchestration failure paths can be driven
/// deliberately. Finality latency is simulated when configured.
#[derive(Debug, Default)]
pub struct InProcessLedger {
    state: Mutex<LedgerState>,
    latency: Option<Duration>,
}

impl InProcessLedger {
    /// A ledger with no artificial latency.
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger whose every operation takes at least `latency` to
    /// confirm, approximating the seconds-scale finality of the real
    /// service.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            latency: Some(latency),
        }
    }

    /// Make the next `n` commit calls fail `Unavailable`.
    pub async fn fail_next_commits(&self, n: u32) {
        self.state.lock().await.fail_commits = n;
    }

    /// Make the next `n` revoke calls fail `Unavailable`.
    pub async fn fail_next_revokes(&self, n: u32) {
        self.state.lock().await.fail_revokes = n;
    }

    /// Forcibly mark a committed fingerprint invalid without going
    /// through `revoke`. Test hook for driving registry/ledger
    /// divergence.
    pub async fn invalidate(&self, fp: &Fingerprint) {
        let mut state = self.state.lock().await;
        if let Some(c) = state.commitments.get_mut(fp) {
            c.valid = false;
        }
    }

    /// The identity keys granted minter rights, in grant order.
    pub async fn minters(&self) -> Vec<String> {
        self.state.lock().await.minters.clone()
    }

    /// How many `is_valid` queries this ledger has answered. Test hook
    /// for asserting that an operation short-circuited before reaching
    /// the ledger.
    pub async fn validity_queries(&self) -> u64 {
        self.state.lock().await.validity_queries
    }

    async fn settle(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl VerificationLedger for InProcessLedger {
    async fn commit(&self, fp: &Fingerprint) -> Result<TransactionRef, LedgerError> {
        self.settle().await;
        let mut state = self.state.lock().await;
        if state.fail_commits > 0 {
            state.fail_commits -= 1;
            return Err(LedgerError::Unavailable("injected commit failure".into()));
        }
        if state.commitments.contains_key(fp) {
            return Err(LedgerError::AlreadyCommitted { fingerprint: *fp });
        }
        let tx = state.next_ref();
        state.commitments.insert(
            *fp,
            Commitment {
                transaction_ref: tx.clone(),
                valid: true,
            },
        );
        Ok(tx)
    }

    async fn revoke(&self, fp: &Fingerprint) -> Result<TransactionRef, LedgerError> {
        self.settle().await;
        let mut state = self.state.lock().await;
        if state.fail_revokes > 0 {
            state.fail_revokes -= 1;
            return Err(LedgerError::Unavailable("injected revoke failure".into()));
        }
        match state.commitments.get(fp) {
            None => Err(LedgerError::NotCommitted { fingerprint: *fp }),
            Some(c) if !c.valid => Err(LedgerError::AlreadyRevoked { fingerprint: *fp }),
            Some(_) => {
                let tx = state.next_ref();
                if let Some(c) = state.commitments.get_mut(fp) {
                    c.valid = false;
                }
                Ok(tx)
            }
        }
    }

    async fn is_valid(&self, fp: &Fingerprint) -> Result<bool, LedgerError> {
        self.settle().await;
        let mut state = self.state.lock().await;
        state.validity_queries += 1;
        Ok(state.commitments.get(fp).map(|c| c.valid).unwrap_or(false))
    }

    async fn commitment_of(
        &self,
        fp: &Fingerprint,
    ) -> Result<Option<TransactionRef>, LedgerError> {
        self.settle().await;
        let state = self.state.lock().await;
        Ok(state
            .commitments
            .get(fp)
            .map(|c| c.transaction_ref.clone()))
    }

    async fn grant_minter(&self, identity_key: &str) -> Result<TransactionRef, LedgerError> {
        self.settle().await;
        let mut state = self.state.lock().await;
        let tx = state.next_ref();
        state.minters.push(identity_key.to_string());
        Ok(tx)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
