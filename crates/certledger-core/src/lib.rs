//! # certledger-core — Foundational Types for CertLedger
//!
//! The bedrock crate of the CertLedger stack. Defines the type-system
//! primitives the rest of the workspace builds on. Every other crate
//! depends on `certledger-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `SubjectId`,
//!    `CredentialId`, `CourseName`, `ContactHandle` — all newtypes with
//!    validated constructors. No bare strings for identifiers.
//!
//! 2. **Opaque external references.** `TransactionRef` and
//!    `ContentAddress` are owned by the verification ledger and the
//!    content archive respectively. The core never interprets them
//!    beyond equality.
//!
//! 3. **Fingerprints flow through one function.** `fingerprint()` is the
//!    only way to produce a `Fingerprint`, so every commitment in the
//!    system uses the same domain-separated, length-prefixed encoding.
//!
//! 4. **UTC-only timestamps.** `Timestamp` is UTC truncated to seconds,
//!    rendered as `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `certledger-*` crates (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod temporal;

pub use error::ValidationError;
pub use fingerprint::{fingerprint, Fingerprint};
pub use identity::{
    ContactHandle, ContentAddress, CourseName, CredentialId, SubjectId, TransactionRef,
};
pub use temporal::Timestamp;
