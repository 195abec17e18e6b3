//! The authority: key store plus issuer plus verifier.

use crate::error::AuthorityError;
use sigil_core::AuthorityConfig;
use sigil_token::{
    ClaimRequest, IssueOptions, KeyPair, KeySource, KeyStore, TokenError, TokenIssuer,
    TokenVerifier, VerificationResult, validate_identity,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Trusted third party holding every participant's keys.
pub struct Authority {
    store: KeyStore,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
}

impl Authority {
    /// Create an authority over an existing store.
    pub fn new(store: KeyStore, issuer: TokenIssuer, verifier: TokenVerifier) -> Self {
        Self {
            store,
            issuer,
            verifier,
        }
    }

    /// Build an authority from configuration, loading the key directory.
    ///
    /// A key directory that cannot be read fails the whole startup.
    pub fn from_config(config: &AuthorityConfig) -> Result<Self, AuthorityError> {
        let store = KeyStore::open(&config.keys_dir)?;
        tracing::info!(
            keys_dir = %config.keys_dir.display(),
            identities = store.len(),
            issuer = %config.issuer,
            "Authority key store ready"
        );
        Ok(Self::new(
            store,
            TokenIssuer::with_validity_secs(&config.issuer, config.validity_secs),
            TokenVerifier::new(&config.issuer),
        ))
    }

    /// Create (or replace) the key pair for `identity`.
    pub fn register(&self, identity: &str) -> Result<Arc<KeyPair>, AuthorityError> {
        let identity = required_identity(identity)?;
        Ok(self.store.create(identity)?)
    }

    /// Issue a token signed with `identity`'s key.
    ///
    /// `sub` defaults to `identity`; `aud` is required.
    pub fn issue(
        &self,
        identity: &str,
        request: &ClaimRequest,
        options: IssueOptions,
    ) -> Result<String, AuthorityError> {
        let identity = required_identity(identity)?;
        let pair = self
            .store
            .get(identity)
            .ok_or_else(|| AuthorityError::UnknownIdentity(identity.to_string()))?;

        let audience = request
            .aud
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or(AuthorityError::MissingAudience)?;
        let subject = request.sub.as_deref().unwrap_or(identity);

        Ok(self
            .issuer
            .issue(&pair, subject, audience, &request.extra, options)?)
    }

    /// Verify `token` against `identity`'s public key.
    ///
    /// Always returns a result; an unknown identity is reported as
    /// `ErrorKind::UnknownIdentity`.
    pub fn verify(
        &self,
        identity: &str,
        token: &str,
        audience: Option<&str>,
        subject: Option<&str>,
    ) -> VerificationResult {
        let identity = identity.trim();
        self.verifier.verify_with(
            token,
            audience,
            subject,
            KeySource::Store {
                store: &self.store,
                identity,
            },
        )
    }

    /// The public key for `identity`, base64-encoded PEM.
    pub fn public_key(&self, identity: &str) -> Result<String, AuthorityError> {
        let identity = required_identity(identity)?;
        self.store
            .get(identity)
            .map(|pair| pair.public_key_base64())
            .ok_or_else(|| AuthorityError::UnknownIdentity(identity.to_string()))
    }

    /// All registered identities, sorted.
    pub fn identities(&self) -> Vec<String> {
        self.store.identities()
    }

    /// Write every key pair to the key directory.
    pub fn dump(&self) -> Result<PathBuf, AuthorityError> {
        Ok(self.store.snapshot_to_durable_store()?)
    }
}

/// Trim `identity` and make sure it can name files in the key directory.
fn required_identity(identity: &str) -> Result<&str, AuthorityError> {
    let identity = identity.trim();
    match validate_identity(identity) {
        Ok(()) => Ok(identity),
        Err(TokenError::EmptyIdentity) => Err(AuthorityError::MissingIdentity),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_token::ErrorKind;
    use tempfile::tempdir;

    fn authority(dir: &std::path::Path) -> Authority {
        let config = AuthorityConfig {
            keys_dir: dir.to_path_buf(),
            ..AuthorityConfig::default()
        };
        Authority::from_config(&config).unwrap()
    }

    #[test]
    fn test_unknown_identity_on_issue_and_verify() {
        let dir = tempdir().unwrap();
        let auth = authority(dir.path());

        let issued = auth.issue("ghost", &ClaimRequest::new("ghost", "serviceb"), IssueOptions::default());
        assert!(matches!(issued, Err(AuthorityError::UnknownIdentity(_))));

        let verified = auth.verify("ghost", "a.b.c", Some("serviceb"), Some("ghost"));
        assert_eq!(verified.error_kind(), Some(ErrorKind::UnknownIdentity));

        assert!(matches!(auth.public_key("ghost"), Err(AuthorityError::UnknownIdentity(_))));
    }

    #[test]
    fn test_blank_identity_rejected() {
        let dir = tempdir().unwrap();
        let auth = authority(dir.path());
        assert!(matches!(auth.register("  "), Err(AuthorityError::MissingIdentity)));
    }

    #[test]
    fn test_path_like_identity_rejected() {
        let dir = tempdir().unwrap();
        let auth = authority(dir.path());
        let err = auth.register("../escaped").unwrap_err();
        assert!(matches!(err, AuthorityError::Token(TokenError::InvalidIdentity(_))));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(auth.identities().is_empty());
    }

    #[test]
    fn test_identity_trimmed_in_every_operation() {
        let dir = tempdir().unwrap();
        let auth = authority(dir.path());
        auth.register(" servicea ").unwrap();
        assert_eq!(auth.identities(), vec!["servicea"]);

        let token = auth
            .issue(" servicea", &ClaimRequest::new("servicea", "serviceb"), IssueOptions::default())
            .unwrap();
        let result = auth.verify(" servicea", &token, Some("serviceb"), Some("servicea"));
        assert!(result.is_valid(), "{:?}", result);
        assert!(auth.public_key("servicea ").is_ok());
    }

    #[test]
    fn test_issue_defaults_subject_and_requires_audience() {
        let dir = tempdir().unwrap();
        let auth = authority(dir.path());
        auth.register("servicea").unwrap();

        let missing = auth.issue("servicea", &ClaimRequest::default(), IssueOptions::default());
        assert!(matches!(missing, Err(AuthorityError::MissingAudience)));

        let request = ClaimRequest {
            aud: Some("serviceb".into()),
            ..ClaimRequest::default()
        };
        let token = auth.issue("servicea", &request, IssueOptions::default()).unwrap();
        let result = auth.verify("servicea", &token, Some("serviceb"), Some("servicea"));
        assert!(result.is_valid(), "{:?}", result);

        let expired = auth.issue("servicea", &request, IssueOptions::expired()).unwrap();
        let result = auth.verify("servicea", &expired, Some("serviceb"), Some("servicea"));
        assert_eq!(result.error_kind(), Some(ErrorKind::Expired));
    }
}
