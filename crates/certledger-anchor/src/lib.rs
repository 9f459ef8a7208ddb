//! # certledger-anchor — Verification Ledger Client Contract
//!
//! The verification ledger is the append-only external service that
//! records fingerprint commitments and revocations and answers validity
//! queries. CertLedger consumes it as an opaque, slow,
//! externally-confirmed collaborator: every mutating call blocks until
//! the ledger reports **finality**, because an unconfirmed write can
//! still be dropped or reordered by the ledger's own consensus.
//!
//! This crate defines the contract ([`VerificationLedger`]) and ships
//! [`InProcessLedger`], a deterministic in-memory implementation used
//! for development deployments and for exercising the orchestrator's
//! failure handling in tests (fault injection, artificial latency).

pub mod ledger;

pub use ledger::{InProcessLedger, LedgerError, VerificationLedger};
