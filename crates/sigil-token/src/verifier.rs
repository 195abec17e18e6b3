//! Token verification.

use crate::claims::{Claims, ExtraClaims};
use crate::error::ErrorKind;
use crate::issuer::ALGORITHM;
use crate::store::KeyStore;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where the signer's public key comes from.
pub enum KeySource<'a> {
    /// Look the signer up in a key store (authority-mediated).
    Store {
        store: &'a KeyStore,
        identity: &'a str,
    },
    /// Use a key obtained out of band (direct peer).
    Key(&'a DecodingKey),
}

/// Outcome of a verification. `claims` is set iff `valid`; `error` iff not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<Claims>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,

    /// Human-readable detail for `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerificationResult {
    /// A successful result.
    pub fn valid(claims: Claims) -> Self {
        Self {
            valid: true,
            claims: Some(claims),
            error: None,
            message: None,
        }
    }

    /// A rejection.
    pub fn invalid(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            claims: None,
            error: Some(kind),
            message: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The rejection reason, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error
    }
}

/// Payload as decoded before claim checks; every registered claim may be absent.
#[derive(Debug, Deserialize)]
struct RawClaims {
    iss: Option<String>,
    sub: Option<String>,
    aud: Option<String>,
    exp: Option<i64>,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(flatten)]
    extra: ExtraClaims,
}

/// Checks tokens against a fixed issuer.
///
/// Checks run in a fixed order and stop at the first failure:
/// inputs present, signature, issuer, audience, subject, expiry.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    issuer: String,
}

impl TokenVerifier {
    /// Create a new token verifier expecting `issuer` in the `iss` claim.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    /// Verify `token` against `key`, expecting it to be addressed to
    /// `expected_audience` and issued for `expected_subject`.
    pub fn verify(
        &self,
        token: &str,
        expected_audience: Option<&str>,
        expected_subject: Option<&str>,
        key: &DecodingKey,
    ) -> VerificationResult {
        let result = match self.check(token, expected_audience, expected_subject, key) {
            Ok(claims) => VerificationResult::valid(claims),
            Err((kind, message)) => VerificationResult::invalid(kind, message),
        };

        match (&result.claims, result.error) {
            (Some(claims), _) => tracing::info!(
                subject = %claims.sub,
                audience = %claims.aud,
                "Valid token"
            ),
            (None, Some(kind)) => tracing::warn!(
                error = %kind,
                message = result.message.as_deref().unwrap_or_default(),
                "Invalid token"
            ),
            (None, None) => {}
        }

        result
    }

    /// Verify with the public key taken from `source`.
    ///
    /// An identity missing from the store yields `UnknownIdentity` before
    /// any token check runs.
    pub fn verify_with(
        &self,
        token: &str,
        expected_audience: Option<&str>,
        expected_subject: Option<&str>,
        source: KeySource<'_>,
    ) -> VerificationResult {
        match source {
            KeySource::Key(key) => self.verify(token, expected_audience, expected_subject, key),
            KeySource::Store { store, identity } => {
                let Some(pair) = store.get(identity) else {
                    tracing::warn!(identity = %identity, "Key not found");
                    return VerificationResult::invalid(
                        ErrorKind::UnknownIdentity,
                        format!("no key pair for '{}'", identity),
                    );
                };
                match pair.decoding_key() {
                    Ok(key) => self.verify(token, expected_audience, expected_subject, &key),
                    Err(e) => VerificationResult::invalid(ErrorKind::BadSignature, e.to_string()),
                }
            }
        }
    }

    fn check(
        &self,
        token: &str,
        expected_audience: Option<&str>,
        expected_subject: Option<&str>,
        key: &DecodingKey,
    ) -> Result<Claims, (ErrorKind, String)> {
        let token = token.trim();
        if token.is_empty() {
            return Err((ErrorKind::MissingToken, "no token specified".to_string()));
        }
        let expected_audience = present(expected_audience)
            .ok_or((ErrorKind::MissingAudience, "no audience specified".to_string()))?;
        let expected_subject = present(expected_subject)
            .ok_or((ErrorKind::MissingSubject, "no subject specified".to_string()))?;

        let raw = jsonwebtoken::decode::<RawClaims>(token, key, &signature_only())
            .map_err(|e| (ErrorKind::BadSignature, e.to_string()))?
            .claims;

        let iss = raw.iss.unwrap_or_default();
        if iss != self.issuer {
            return Err((
                ErrorKind::BadIssuer,
                format!("jwt issuer invalid. expected: {}", self.issuer),
            ));
        }

        let aud = raw.aud.unwrap_or_default();
        if aud != expected_audience {
            return Err((
                ErrorKind::AudienceMismatch,
                format!("jwt audience invalid. expected: {}", expected_audience),
            ));
        }

        let sub = raw.sub.unwrap_or_default();
        if sub != expected_subject {
            return Err((
                ErrorKind::SubjectMismatch,
                format!("jwt subject invalid. expected: {}", expected_subject),
            ));
        }

        let Some(exp) = raw.exp else {
            return Err((ErrorKind::Expired, "jwt has no expiration".to_string()));
        };
        let claims = Claims {
            iss,
            sub,
            aud,
            exp,
            iat: raw.iat,
            extra: raw.extra,
        };
        if claims.is_expired_at(Utc::now().timestamp()) {
            let at = claims
                .expires_at()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| exp.to_string());
            return Err((ErrorKind::Expired, format!("jwt expired at {}", at)));
        }

        Ok(claims)
    }
}

/// Signature and algorithm only; claim checks are done by hand, in order.
fn signature_only() -> Validation {
    let mut validation = Validation::new(ALGORITHM);
    validation.leeway = 0;
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();
    validation
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
