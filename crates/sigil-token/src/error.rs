//! Error types for the token crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while managing keys or issuing tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Failed to generate keypair.
    #[error("failed to generate keypair: {0}")]
    KeyGenerationFailed(String),

    /// Failed to parse private key.
    #[error("failed to parse private key: {0}")]
    InvalidPrivateKey(String),

    /// Failed to parse public key.
    #[error("failed to parse public key: {0}")]
    InvalidPublicKey(String),

    /// The key pair can only verify.
    #[error("key pair for '{identity}' has no private key")]
    MissingPrivateKey { identity: String },

    /// Identities are map keys and file name prefixes; they cannot be empty.
    #[error("identity must not be empty")]
    EmptyIdentity,

    /// The identity would escape the key directory.
    #[error("invalid identity '{0}'")]
    InvalidIdentity(String),

    /// The signing primitive failed.
    #[error("failed to sign token: {0}")]
    Signing(String),

    /// Failed to parse token.
    #[error("failed to parse token: {0}")]
    TokenParseFailed(String),

    /// IO error (reading/writing keys).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Why a token was rejected.
///
/// Variants are listed in the order the verifier checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingToken,
    MissingAudience,
    MissingSubject,
    BadSignature,
    BadIssuer,
    AudienceMismatch,
    SubjectMismatch,
    Expired,
    /// No key pair is known for the signing identity.
    UnknownIdentity,
}

impl ErrorKind {
    /// The request itself was incomplete, as opposed to the token being bad.
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            ErrorKind::MissingToken | ErrorKind::MissingAudience | ErrorKind::MissingSubject
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingToken => "missing_token",
            ErrorKind::MissingAudience => "missing_audience",
            ErrorKind::MissingSubject => "missing_subject",
            ErrorKind::BadSignature => "bad_signature",
            ErrorKind::BadIssuer => "bad_issuer",
            ErrorKind::AudienceMismatch => "audience_mismatch",
            ErrorKind::SubjectMismatch => "subject_mismatch",
            ErrorKind::Expired => "expired",
            ErrorKind::UnknownIdentity => "unknown_identity",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_wire_names_match_display() {
        for kind in [
            ErrorKind::MissingToken,
            ErrorKind::MissingAudience,
            ErrorKind::MissingSubject,
            ErrorKind::BadSignature,
            ErrorKind::BadIssuer,
            ErrorKind::AudienceMismatch,
            ErrorKind::SubjectMismatch,
            ErrorKind::Expired,
            ErrorKind::UnknownIdentity,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn test_missing_input_kinds() {
        assert!(ErrorKind::MissingSubject.is_missing_input());
        assert!(!ErrorKind::Expired.is_missing_input());
        assert!(!ErrorKind::UnknownIdentity.is_missing_input());
    }
}
