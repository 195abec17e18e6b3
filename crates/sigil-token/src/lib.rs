//! # sigil-token
//!
//! The token trust core of Sigil.
//!
//! This crate provides functionality for:
//! - Generating 2048-bit RSA key pairs per participant identity
//! - Holding key pairs in a concurrency-safe [`KeyStore`] with file snapshots
//! - Issuing RS256-signed tokens with enforced `iss`/`sub`/`aud`/`exp` claims
//! - Verifying tokens into a typed [`VerificationResult`]
//!
//! ## Two Trust Models, One Verifier
//!
//! | Model | Signing key | Verification key |
//! |-------|-------------|------------------|
//! | **Authority-mediated** | Looked up in the authority's [`KeyStore`] | Same store |
//! | **Direct peer** | The caller's own [`KeyPair`] | Caller's public key, shipped out of band |
//!
//! Both go through [`TokenVerifier`]; only the [`KeySource`] differs.

pub mod claims;
pub mod error;
pub mod inspect;
pub mod issuer;
pub mod keys;
pub mod store;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testutil;

pub use claims::{ClaimRequest, ClaimValue, Claims, ExtraClaims};
pub use error::{ErrorKind, TokenError};
pub use inspect::{TokenInfo, inspect_unverified};
pub use issuer::{IssueOptions, TokenIssuer};
pub use jsonwebtoken::DecodingKey;
pub use keys::{KeyPair, validate_identity};
pub use store::KeyStore;
pub use verifier::{KeySource, TokenVerifier, VerificationResult};
