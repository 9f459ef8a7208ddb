//! Route modules for the CertLedger API surface.

pub mod credentials;
pub mod institutions;
pub mod subjects;
