//! # Credential Fingerprinting
//!
//! Deterministic mapping from a credential's identifying fields to a
//! fixed-size commitment value. The fingerprint is what the verification
//! ledger records; the registry never stores credential contents on the
//! ledger, only this commitment.
//!
//! ## Encoding Invariant
//!
//! The three fields are hashed with a domain-separation tag and a
//! length prefix per field. Length prefixes keep field boundaries
//! unambiguous: `("ab", "c")` and `("a", "bc")` hash differently, which
//! a plain delimiter-joined encoding cannot guarantee.
//!
//! ## Snapshot Invariant
//!
//! Every recomputation after issuance (revoke, verify, reconcile) must
//! be fed the subject-name **snapshot** stored on the credential record,
//! never the live subject record. A rename after issuance would
//! otherwise diverge from the committed value and break verification.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;
use crate::identity::{CourseName, SubjectId};

/// Domain-separation tag; versioned so a future encoding change cannot
/// collide with values committed under this one.
const DOMAIN_TAG: &[u8] = b"certledger.fingerprint.v1";

/// A 32-byte commitment to a credential's identifying fields.
///
/// Produced exclusively by [`fingerprint()`]. Rendered and serialized as
/// lowercase hex so ledger and registry logs stay human-comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse from a 64-character lowercase or uppercase hex string.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.len() != 64 {
            return Err(ValidationError::InvalidFingerprint(format!(
                "expected 64 hex characters, got {}",
                s.len()
            )));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hex = std::str::from_utf8(chunk)
                .map_err(|_| ValidationError::InvalidFingerprint(s.to_string()))?;
            bytes[i] = u8::from_str_radix(hex, 16)
                .map_err(|_| ValidationError::InvalidFingerprint(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&s).map_err(D::Error::custom)
    }
}

/// Compute the fingerprint of a credential's identifying fields.
///
/// Pure and deterministic: identical inputs always produce the same
/// output, and any differing field changes the output. Collision
/// resistance is inherited from SHA-256 and treated as a design
/// assumption. Empty fields are rejected by the identifier constructors
/// before this is ever reached; the `name` argument is the caller's
/// responsibility and is hashed as given.
pub fn fingerprint(name: &str, subject_id: &SubjectId, course: &CourseName) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_TAG);
    for field in [name, subject_id.as_str(), course.as_str()] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Fingerprint(bytes)
}
