//! RSA key pairs bound to a participant identity.

use crate::error::TokenError;
use base64::{Engine, engine::general_purpose::STANDARD};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rand_core::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Modulus size for generated keys.
pub const RSA_KEY_BITS: usize = 2048;

/// Extension of persisted key files.
pub const KEY_FILE_EXTENSION: &str = "pem";

/// An RSA key pair for one identity, held as PEM text.
///
/// The private half is optional: a pair loaded from a public key alone is
/// still usable for verification.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    identity: String,
    public_key_pem: String,
    private_key_pem: Option<String>,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("identity", &self.identity)
            .field("has_private_key", &self.private_key_pem.is_some())
            .finish()
    }
}

impl KeyPair {
    /// Generate a new random 2048-bit key pair for `identity`.
    pub fn generate(identity: impl Into<String>) -> Result<Self, TokenError> {
        let identity = checked_identity(identity.into())?;
        tracing::info!(identity = %identity, "Generating new key pair");

        let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|e| TokenError::KeyGenerationFailed(e.to_string()))?;
        let private_key_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| TokenError::KeyGenerationFailed(e.to_string()))?
            .to_string();
        let public_key_pem = RsaPublicKey::from(&private_key)
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| TokenError::KeyGenerationFailed(e.to_string()))?;

        Ok(Self {
            identity,
            public_key_pem,
            private_key_pem: Some(private_key_pem),
        })
    }

    /// Build a key pair from PEM halves.
    ///
    /// Either half may be missing, but not both. When only the private half
    /// is given, the public half is derived from it.
    pub fn from_pem(
        identity: impl Into<String>,
        public_key_pem: Option<String>,
        private_key_pem: Option<String>,
    ) -> Result<Self, TokenError> {
        let identity = checked_identity(identity.into())?;

        let private_key = private_key_pem
            .as_deref()
            .map(parse_private_key)
            .transpose()?;

        let public_key_pem = match (public_key_pem, &private_key) {
            (Some(pem), _) => {
                parse_public_key(&pem)?;
                pem
            }
            (None, Some(private_key)) => RsaPublicKey::from(private_key)
                .to_pkcs1_pem(LineEnding::LF)
                .map_err(|e| TokenError::InvalidPrivateKey(e.to_string()))?,
            (None, None) => {
                return Err(TokenError::InvalidPublicKey(format!(
                    "no key material for '{}'",
                    identity
                )));
            }
        };

        Ok(Self {
            identity,
            public_key_pem,
            private_key_pem,
        })
    }

    /// Build a verification-only key pair.
    pub fn public_only(identity: impl Into<String>, public_key_pem: impl Into<String>) -> Result<Self, TokenError> {
        Self::from_pem(identity, Some(public_key_pem.into()), None)
    }

    /// Get the identity this pair belongs to.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Get the public key as PEM text.
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    /// Get the private key as PEM text, if held.
    pub fn private_key_pem(&self) -> Option<&str> {
        self.private_key_pem.as_deref()
    }

    /// Whether this pair can sign.
    pub fn has_private_key(&self) -> bool {
        self.private_key_pem.is_some()
    }

    /// Public key PEM, base64-encoded, as handed out over HTTP.
    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(self.public_key_pem.as_bytes())
    }

    /// Key for signing tokens.
    pub fn encoding_key(&self) -> Result<EncodingKey, TokenError> {
        let pem = self
            .private_key_pem
            .as_deref()
            .ok_or_else(|| TokenError::MissingPrivateKey {
                identity: self.identity.clone(),
            })?;
        EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| TokenError::InvalidPrivateKey(e.to_string()))
    }

    /// Key for verifying tokens.
    pub fn decoding_key(&self) -> Result<DecodingKey, TokenError> {
        decoding_key_from_pem(&self.public_key_pem)
    }

    /// Save the pair as `<identity>-public.pem` / `<identity>-private.pem` in `dir`.
    ///
    /// Verification-only pairs write the public file alone.
    pub fn save_to_dir(&self, dir: &Path) -> Result<(), TokenError> {
        fs::write(public_key_path(dir, &self.identity), &self.public_key_pem)?;
        if let Some(private_key_pem) = &self.private_key_pem {
            fs::write(private_key_path(dir, &self.identity), private_key_pem)?;
        }
        Ok(())
    }

    /// Load a signing key pair from a private key file.
    pub fn load_private_file(identity: impl Into<String>, path: &Path) -> Result<Self, TokenError> {
        let pem = fs::read_to_string(path)?;
        Self::from_pem(identity, None, Some(pem))
    }
}

/// Path of the public key file for `identity` in `dir`.
pub fn public_key_path(dir: &Path, identity: &str) -> PathBuf {
    dir.join(format!("{}-public.{}", identity, KEY_FILE_EXTENSION))
}

/// Path of the private key file for `identity` in `dir`.
pub fn private_key_path(dir: &Path, identity: &str) -> PathBuf {
    dir.join(format!("{}-private.{}", identity, KEY_FILE_EXTENSION))
}

/// Build a verification key from PEM text (PKCS#1 or SPKI).
pub fn decoding_key_from_pem(pem: &str) -> Result<DecodingKey, TokenError> {
    DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| TokenError::InvalidPublicKey(e.to_string()))
}

/// Load a verification key from a PEM file.
pub fn load_public_key_file(path: &Path) -> Result<DecodingKey, TokenError> {
    let pem = fs::read_to_string(path)?;
    decoding_key_from_pem(&pem)
}

/// Check that `identity` can serve as a file name prefix inside a key directory.
pub fn validate_identity(identity: &str) -> Result<(), TokenError> {
    if identity.trim().is_empty() {
        return Err(TokenError::EmptyIdentity);
    }
    if identity == "." || identity == ".." || identity.contains(['/', '\\', '\0']) {
        return Err(TokenError::InvalidIdentity(identity.to_string()));
    }
    Ok(())
}

fn checked_identity(identity: String) -> Result<String, TokenError> {
    validate_identity(&identity)?;
    Ok(identity)
}

fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, TokenError> {
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|e| TokenError::InvalidPrivateKey(e.to_string()))
}

fn parse_public_key(pem: &str) -> Result<RsaPublicKey, TokenError> {
    RsaPublicKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPublicKey::from_public_key_pem(pem))
        .map_err(|e| TokenError::InvalidPublicKey(e.to_string()))
}
