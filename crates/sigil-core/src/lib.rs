//! # sigil-core
//!
//! Configuration shared by the Sigil crates.
//!
//! Sigil demonstrates service-to-service authentication with signed tokens
//! under two trust models:
//!
//! | Model | Who signs | Who verifies |
//! |-------|-----------|--------------|
//! | **Authority-mediated** | The authority, with the caller's key it holds | The authority, on the callee's behalf |
//! | **Direct peer** | The caller, with its own private key | The callee, with the caller's public key |
//!
//! This crate only carries the configuration for both sides; the token
//! machinery lives in `sigil-token`.

pub mod config;

pub use config::{AuthorityConfig, ConfigError, PeerConfig, SigilConfig};
