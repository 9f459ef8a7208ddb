//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers of the credential domain. These
//! prevent accidental identifier confusion — you cannot pass a
//! `SubjectId` where a `CredentialId` is expected, and you cannot hand
//! the content archive a ledger transaction reference.
//!
//! `TransactionRef` and `ContentAddress` are deliberately uninterpreted:
//! their format is owned by the verification ledger and the content
//! archive. The core compares them for equality and nothing else.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

const MAX_IDENTIFIER_LEN: usize = 255;

fn validated(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    if trimmed.len() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_IDENTIFIER_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Opaque identifier of a credential holder. Assigned at registration,
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    /// Construct a subject id, rejecting empty or oversized input.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        Ok(Self(validated(value.as_ref(), "subject id")?))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "subject:{}", self.0)
    }
}

/// Unique identifier of an issued credential. Generated at issuance,
/// never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(Uuid);

impl CredentialId {
    /// Generate a fresh random credential identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a credential identifier from its canonical string form.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|e| ValidationError::InvalidCredentialId(format!("{value:?}: {e}")))
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "credential:{}", self.0)
    }
}

/// Name of a course a subject can be enrolled in. One enrollment per
/// (subject, course) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseName(String);

impl CourseName {
    /// Construct a course name, rejecting empty or oversized input.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        Ok(Self(validated(value.as_ref(), "course name")?))
    }

    /// The course name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CourseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contact handle of a subject (e-mail or similar). Optional, unique
/// when present, usable for lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactHandle(String);

impl ContactHandle {
    /// Construct a contact handle, rejecting empty or oversized input.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        Ok(Self(validated(value.as_ref(), "contact handle")?))
    }

    /// The handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContactHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a finalized ledger transaction. Format owned by
/// the verification ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionRef(pub String);

impl std::fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque address of a blob in the content archive. Format owned by the
/// archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentAddress(pub String);

impl std::fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
