//! Authority service configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the central token authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityConfig {
    /// Bind address, e.g. "0.0.0.0:5555".
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Value stamped into (and required in) the `iss` claim of every token.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Directory holding `<identity>-public.pem` / `<identity>-private.pem`.
    #[serde(default = "default_keys_dir")]
    pub keys_dir: PathBuf,

    /// Lifetime of issued tokens, in seconds.
    #[serde(default = "default_validity_secs")]
    pub validity_secs: u64,
}

fn default_bind() -> String {
    "0.0.0.0:5555".to_string()
}

fn default_issuer() -> String {
    "https://jwt-factory/".to_string()
}

fn default_keys_dir() -> PathBuf {
    PathBuf::from("./keys")
}

fn default_validity_secs() -> u64 {
    60 * 60
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            issuer: default_issuer(),
            keys_dir: default_keys_dir(),
            validity_secs: default_validity_secs(),
        }
    }
}
