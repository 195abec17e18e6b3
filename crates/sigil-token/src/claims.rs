//! Token claims.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Claim names owned by the issuer. Callers cannot set these as extras.
pub const RESERVED_CLAIMS: &[&str] = &["iss", "sub", "aud", "exp", "iat", "nbf", "jti"];

/// A caller-supplied claim value.
///
/// Only scalars are accepted; arrays, objects and null fail to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for ClaimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimValue::Bool(b) => write!(f, "{}", b),
            ClaimValue::Integer(i) => write!(f, "{}", i),
            ClaimValue::Float(x) => write!(f, "{}", x),
            ClaimValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        ClaimValue::String(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        ClaimValue::String(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        ClaimValue::Integer(value)
    }
}

impl From<f64> for ClaimValue {
    fn from(value: f64) -> Self {
        ClaimValue::Float(value)
    }
}

impl From<bool> for ClaimValue {
    fn from(value: bool) -> Self {
        ClaimValue::Bool(value)
    }
}

impl ClaimValue {
    /// Parse a command-line value: booleans and numbers first, string otherwise.
    pub fn parse_loose(raw: &str) -> Self {
        if let Ok(b) = raw.parse::<bool>() {
            return ClaimValue::Bool(b);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return ClaimValue::Integer(i);
        }
        if let Ok(x) = raw.parse::<f64>() {
            if x.is_finite() {
                return ClaimValue::Float(x);
            }
        }
        ClaimValue::String(raw.to_string())
    }
}

/// Extra claims beyond the registered ones, ordered by name.
pub type ExtraClaims = BTreeMap<String, ClaimValue>;

/// The full claim set carried by an issued token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer, fixed per deployment.
    pub iss: String,
    /// Signer's identity.
    pub sub: String,
    /// Intended verifier's identity.
    pub aud: String,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    /// Issued at (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Caller-supplied claims.
    #[serde(flatten)]
    pub extra: ExtraClaims,
}

impl Claims {
    /// Expiration as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Whether the token is expired at `now` (seconds since epoch).
    /// A token expiring exactly now is expired.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }

    /// Check if the token has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}

/// The caller-supplied part of a token request.
///
/// This is the JSON body accepted by the authority's issue endpoint:
/// `{"sub": "...", "aud": "...", "<extra>": <scalar>, ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimRequest {
    /// Subject; defaults to the signing identity when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Audience; required for issuance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Everything else.
    #[serde(flatten)]
    pub extra: ExtraClaims,
}

impl ClaimRequest {
    /// Create a request for `sub` -> `aud`.
    pub fn new(sub: impl Into<String>, aud: impl Into<String>) -> Self {
        Self {
            sub: Some(sub.into()),
            aud: Some(aud.into()),
            extra: ExtraClaims::new(),
        }
    }

    /// Add an extra claim.
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<ClaimValue>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Nothing at all was supplied.
    pub fn is_empty(&self) -> bool {
        self.sub.is_none() && self.aud.is_none() && self.extra.is_empty()
    }
}

/// Remove reserved names from caller-supplied extras, returning what was dropped.
pub fn strip_reserved(extra: &mut ExtraClaims) -> Vec<String> {
    let dropped: Vec<String> = extra
        .keys()
        .filter(|k| RESERVED_CLAIMS.contains(&k.as_str()))
        .cloned()
        .collect();
    for name in &dropped {
        extra.remove(name);
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_claim_request_from_json() {
        let req: ClaimRequest = serde_json::from_value(json!({
            "sub": "servicea",
            "aud": "serviceb",
            "scope": "read",
            "level": 3,
            "ratio": 0.5,
            "admin": false
        }))
        .unwrap();

        assert_eq!(req.sub.as_deref(), Some("servicea"));
        assert_eq!(req.aud.as_deref(), Some("serviceb"));
        assert_eq!(req.extra["scope"], ClaimValue::String("read".into()));
        assert_eq!(req.extra["level"], ClaimValue::Integer(3));
        assert_eq!(req.extra["ratio"], ClaimValue::Float(0.5));
        assert_eq!(req.extra["admin"], ClaimValue::Bool(false));
    }

    #[test]
    fn test_non_scalar_claims_rejected() {
        let nested = serde_json::from_value::<ClaimRequest>(json!({ "aud": "b", "roles": ["x"] }));
        assert!(nested.is_err());

        let null = serde_json::from_value::<ClaimRequest>(json!({ "aud": "b", "note": null }));
        assert!(null.is_err());
    }

    #[test]
    fn test_claims_serialize_flat() {
        let claims = Claims {
            iss: "https://issuer".into(),
            sub: "servicea".into(),
            aud: "serviceb".into(),
            exp: 2_000_000_000,
            iat: None,
            extra: ExtraClaims::from([("scope".to_string(), ClaimValue::from("read"))]),
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(
            value,
            json!({
                "iss": "https://issuer",
                "sub": "servicea",
                "aud": "serviceb",
                "exp": 2_000_000_000i64,
                "scope": "read"
            })
        );
    }

    #[test]
    fn test_expiry_boundary() {
        let claims = Claims {
            iss: "i".into(),
            sub: "s".into(),
            aud: "a".into(),
            exp: 100,
            iat: None,
            extra: ExtraClaims::new(),
        };
        assert!(!claims.is_expired_at(99));
        assert!(claims.is_expired_at(100));
    }

    #[test]
    fn test_strip_reserved() {
        let mut extra = ExtraClaims::from([
            ("iss".to_string(), ClaimValue::from("evil")),
            ("exp".to_string(), ClaimValue::from(1i64)),
            ("scope".to_string(), ClaimValue::from("read")),
        ]);
        let dropped = strip_reserved(&mut extra);
        assert_eq!(dropped, vec!["exp".to_string(), "iss".to_string()]);
        assert_eq!(extra.len(), 1);
    }

    #[test]
    fn test_parse_loose() {
        assert_eq!(ClaimValue::parse_loose("true"), ClaimValue::Bool(true));
        assert_eq!(ClaimValue::parse_loose("42"), ClaimValue::Integer(42));
        assert_eq!(ClaimValue::parse_loose("1.5"), ClaimValue::Float(1.5));
        assert_eq!(ClaimValue::parse_loose("read"), ClaimValue::String("read".into()));
        assert_eq!(ClaimValue::parse_loose("NaN"), ClaimValue::String("NaN".into()));
    }
}
