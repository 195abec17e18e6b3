//! Direct peer trust: self-signed tokens, out-of-band public keys.
//!
//! A participant's `keys_dir` holds its own `<identity>-private.pem` and the
//! `<caller>-public.pem` of every caller it accepts. No third party is
//! contacted at runtime.

use crate::error::PeerError;
use sigil_core::PeerConfig;
use sigil_token::{
    ExtraClaims, IssueOptions, KeySource, KeyStore, TokenError, TokenIssuer, TokenVerifier,
    VerificationResult,
};

/// Signs outbound tokens and verifies inbound ones without an authority.
pub struct DirectTrust {
    identity: String,
    keys: KeyStore,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
}

impl DirectTrust {
    /// Create from an already populated key store.
    pub fn new(identity: impl Into<String>, issuer: impl Into<String>, validity_secs: u64, keys: KeyStore) -> Self {
        let issuer = issuer.into();
        Self {
            identity: identity.into(),
            keys,
            issuer: TokenIssuer::with_validity_secs(issuer.clone(), validity_secs),
            verifier: TokenVerifier::new(issuer),
        }
    }

    /// Load keys from `config.keys_dir`. A missing directory means no keys.
    pub fn from_config(config: &PeerConfig) -> Result<Self, PeerError> {
        let keys = if config.keys_dir.is_dir() {
            KeyStore::open(&config.keys_dir)?
        } else {
            tracing::warn!(
                keys_dir = %config.keys_dir.display(),
                "Key directory not found, direct peer flows are disabled"
            );
            KeyStore::new(&config.keys_dir)
        };

        let trust = Self::new(&config.identity, &config.issuer, config.validity_secs, keys);
        if !trust.can_sign() {
            tracing::warn!(identity = %config.identity, "No private key for direct peer signing");
        }
        Ok(trust)
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Whether this participant holds its own private key.
    pub fn can_sign(&self) -> bool {
        self.keys
            .get(&self.identity)
            .is_some_and(|pair| pair.has_private_key())
    }

    /// Sign a token from this participant to `audience`.
    pub fn sign(&self, audience: &str, options: IssueOptions) -> Result<String, PeerError> {
        let pair = self
            .keys
            .get(&self.identity)
            .ok_or_else(|| TokenError::MissingPrivateKey {
                identity: self.identity.clone(),
            })?;
        let token = self
            .issuer
            .issue(&pair, &self.identity, audience, &ExtraClaims::new(), options)?;
        Ok(token)
    }

    /// Verify a token claiming to come from `caller`, addressed to this participant.
    pub fn verify(&self, token: &str, caller: &str) -> VerificationResult {
        self.verifier.verify_with(
            token,
            Some(&self.identity),
            Some(caller),
            KeySource::Store {
                store: &self.keys,
                identity: caller,
            },
        )
    }
}
