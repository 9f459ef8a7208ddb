//! # Validation Errors
//!
//! Input validation failures for the core identifier types. These are
//! rejected before any external store is touched, so they carry enough
//! structure for the caller to report the offending field.

use thiserror::Error;

/// Validation failure when constructing a core domain type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or whitespace-only.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A field exceeded its maximum length.
    #[error("{field} must not exceed {max} characters")]
    TooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum permitted length.
        max: usize,
    },

    /// A credential identifier could not be parsed.
    #[error("invalid credential id: {0}")]
    InvalidCredentialId(String),

    /// A fingerprint hex string could not be parsed.
    #[error("invalid fingerprint encoding: {0}")]
    InvalidFingerprint(String),

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
