//! Token issuance.

use crate::claims::{Claims, ExtraClaims, strip_reserved};
use crate::error::TokenError;
use crate::keys::KeyPair;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};

/// The signature algorithm every participant agrees on.
pub const ALGORITHM: Algorithm = Algorithm::RS256;

/// Upper bound on a configured validity window (ten years).
const MAX_VALIDITY_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Per-call issuance switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueOptions {
    /// Backdate `exp` by one validity window so the token is already expired.
    /// Only useful for exercising rejection paths.
    pub expired: bool,
}

impl IssueOptions {
    /// Options for a pre-expired token.
    pub fn expired() -> Self {
        Self { expired: true }
    }
}

/// Builds and signs tokens with a fixed issuer and validity window.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    issuer: String,
    validity: Duration,
}

impl TokenIssuer {
    /// Create a new issuer.
    pub fn new(issuer: impl Into<String>, validity: Duration) -> Self {
        Self {
            issuer: issuer.into(),
            validity,
        }
    }

    /// Create an issuer with a validity window in seconds.
    pub fn with_validity_secs(issuer: impl Into<String>, secs: u64) -> Self {
        let secs = secs.min(MAX_VALIDITY_SECS) as i64;
        Self::new(issuer, Duration::seconds(secs))
    }

    /// Assemble the final claim set without signing it.
    pub fn build_claims(
        &self,
        subject: &str,
        audience: &str,
        extra: &ExtraClaims,
        options: IssueOptions,
    ) -> Claims {
        let mut extra = extra.clone();
        let dropped = strip_reserved(&mut extra);
        if !dropped.is_empty() {
            tracing::warn!(claims = ?dropped, "Ignoring caller-supplied reserved claims");
        }
        if extra.is_empty() {
            tracing::warn!(subject = %subject, audience = %audience, "No claims specified");
        }

        let now = Utc::now();
        let exp = if options.expired {
            tracing::info!(subject = %subject, audience = %audience, "Issuing expired token");
            now - self.validity
        } else {
            now + self.validity
        };

        Claims {
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            aud: audience.to_string(),
            exp: exp.timestamp(),
            iat: Some(now.timestamp()),
            extra,
        }
    }

    /// Issue a token signed with `key`.
    ///
    /// The key's identity goes into the `kid` header so an inspector can tell
    /// which key to verify with.
    pub fn issue(
        &self,
        key: &KeyPair,
        subject: &str,
        audience: &str,
        extra: &ExtraClaims,
        options: IssueOptions,
    ) -> Result<String, TokenError> {
        let encoding_key = key.encoding_key()?;
        let claims = self.build_claims(subject, audience, extra, options);
        let token = sign(&encoding_key, Some(key.identity()), &claims)?;
        tracing::info!(
            identity = %key.identity(),
            subject = %claims.sub,
            audience = %claims.aud,
            exp = claims.exp,
            "Issued token"
        );
        Ok(token)
    }
}

/// Sign an already assembled claim set.
pub fn sign(key: &EncodingKey, kid: Option<&str>, claims: &Claims) -> Result<String, TokenError> {
    let mut header = Header::new(ALGORITHM);
    header.kid = kid.map(str::to_string);
    jsonwebtoken::encode(&header, claims, key).map_err(|e| TokenError::Signing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::ClaimValue;
    use crate::inspect::inspect_unverified;
    use crate::testutil::signer;

    fn issuer() -> TokenIssuer {
        TokenIssuer::with_validity_secs("https://jwt-factory/", 3600)
    }

    #[test]
    fn test_claims_carry_fixed_fields() {
        let claims = issuer().build_claims("servicea", "serviceb", &ExtraClaims::new(), IssueOptions::default());
        let now = Utc::now().timestamp();

        assert_eq!(claims.iss, "https://jwt-factory/");
        assert_eq!(claims.sub, "servicea");
        assert_eq!(claims.aud, "serviceb");
        assert!(claims.exp > now + 3500);
        assert!(claims.exp <= now + 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_expired_option_backdates() {
        let claims = issuer().build_claims("servicea", "serviceb", &ExtraClaims::new(), IssueOptions::expired());
        let now = Utc::now().timestamp();

        assert!(claims.exp <= now - 3600);
        assert!(claims.is_expired());
    }

    #[test]
    fn test_reserved_extras_cannot_override() {
        let extra = ExtraClaims::from([
            ("iss".to_string(), ClaimValue::from("https://evil/")),
            ("exp".to_string(), ClaimValue::from(i64::MAX)),
            ("scope".to_string(), ClaimValue::from("read")),
        ]);
        let claims = issuer().build_claims("servicea", "serviceb", &extra, IssueOptions::default());

        assert_eq!(claims.iss, "https://jwt-factory/");
        assert!(claims.exp < i64::MAX);
        assert_eq!(claims.extra.len(), 1);
    }

    #[test]
    fn test_issue_sets_header() {
        let token = issuer()
            .issue(&signer(), "servicea", "serviceb", &ExtraClaims::new(), IssueOptions::default())
            .unwrap();

        assert_eq!(token.split('.').count(), 3);
        let info = inspect_unverified(&token).unwrap();
        assert_eq!(info.header.alg, Algorithm::RS256);
        assert_eq!(info.header.kid.as_deref(), Some("servicea"));
        assert_eq!(info.subject(), Some("servicea"));
    }

    #[test]
    fn test_verification_only_pair_cannot_issue() {
        let public_only = KeyPair::public_only("servicea", signer().public_key_pem()).unwrap();
        let result = issuer().issue(&public_only, "servicea", "serviceb", &ExtraClaims::new(), IssueOptions::default());
        assert!(matches!(result, Err(TokenError::MissingPrivateKey { .. })));
    }
}
