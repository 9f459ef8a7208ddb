//! # certledger-archive — Content Archive Client Contract
//!
//! The content archive stores the rendered credential documents. It is
//! immutable and content-addressed: the address of a blob is a
//! deterministic function of its bytes, there is no update operation,
//! and re-uploading identical bytes is a no-op that yields the same
//! address. That idempotency is what makes the orchestrator's
//! reconciliation pass safe to re-drive after a partial failure.
//!
//! This crate defines the contract ([`ContentArchive`]) plus two
//! implementations: [`MemoryArchive`] for tests and [`FsArchive`] for
//! single-node deployments.

pub mod archive;

pub use archive::{content_address, ArchiveError, ContentArchive, FsArchive, MemoryArchive};
