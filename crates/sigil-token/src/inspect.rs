//! Decoding tokens without verifying them.
//!
//! Nothing returned from here is trustworthy. It exists for debugging and for
//! picking which key to verify with.

use crate::error::TokenError;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Header, decode_header};
use serde_json::{Map, Value};

/// Unverified view of a token.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    /// The JOSE header.
    pub header: Header,
    /// The payload as raw JSON.
    pub claims: Map<String, Value>,
}

impl TokenInfo {
    /// Claimed subject.
    pub fn subject(&self) -> Option<&str> {
        self.string_claim("sub")
    }

    /// Claimed audience.
    pub fn audience(&self) -> Option<&str> {
        self.string_claim("aud")
    }

    /// Claimed issuer.
    pub fn issuer(&self) -> Option<&str> {
        self.string_claim("iss")
    }

    fn string_claim(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }
}

/// Decode a token's header and payload without checking the signature.
pub fn inspect_unverified(token: &str) -> Result<TokenInfo, TokenError> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::TokenParseFailed(
            "token must have 3 parts separated by dots".to_string(),
        ));
    }

    let header = decode_header(token.trim())
        .map_err(|e| TokenError::TokenParseFailed(format!("failed to decode header: {}", e)))?;

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| TokenError::TokenParseFailed(format!("failed to decode payload: {}", e)))?;

    let claims: Map<String, Value> = serde_json::from_slice(&payload)
        .map_err(|e| TokenError::TokenParseFailed(format!("failed to parse claims: {}", e)))?;

    Ok(TokenInfo { header, claims })
}
