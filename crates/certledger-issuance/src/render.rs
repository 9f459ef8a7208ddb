//! # Credential Document Rendering Contract
//!
//! Turning credential fields into a human-readable artifact is an
//! external collaborator's job. The orchestrator only needs bytes to
//! archive, so the contract is a pure function of the identifying
//! fields. [`TextRenderer`] is the reference implementation used by the
//! development server and tests; a PDF or HTML renderer plugs in behind
//! the same trait.

use thiserror::Error;

use certledger_core::{CourseName, CredentialId};

/// Rendering failed.
#[derive(Error, Debug)]
#[error("renderer failed: {0}")]
pub struct RenderError(pub String);

/// The fields a renderer receives. All values are issuance-time
/// snapshots; the renderer must not fetch live registry data.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    /// The credential being rendered.
    pub credential_id: CredentialId,
    /// Subject display name snapshot.
    pub subject_name: &'a str,
    /// The certified course.
    pub course: &'a CourseName,
}

/// Contract for the external document renderer.
pub trait CredentialRenderer: Send + Sync {
    /// Render the credential document. Must be deterministic for a
    /// given request — the archive address of the output is the
    /// idempotency key for re-driven issuances.
    fn render(&self, request: &RenderRequest<'_>) -> Result<Vec<u8>, RenderError>;
}

/// Plain-text reference renderer.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    /// Base URL embedded as the verification pointer, e.g.
    /// `https://verify.example.org`.
    pub verification_base: String,
}

impl TextRenderer {
    /// A renderer pointing verifiers at the given base URL.
    pub fn new(verification_base: impl Into<String>) -> Self {
        Self {
            verification_base: verification_base.into(),
        }
    }
}

impl CredentialRenderer for TextRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> Result<Vec<u8>, RenderError> {
        let id = request.credential_id.as_uuid();
        let document = format!(
            "Certificate of Completion\n\
             \n\
             This is to certify that\n\
             {name}\n\
             has successfully completed the course:\n\
             {course}\n\
             \n\
             Credential ID: {id}\n\
             Verify at: {base}/?id={id}\n",
            name = request.subject_name,
            course = request.course,
            base = self.verification_base,
        );
        Ok(document.into_bytes())
    }
}
