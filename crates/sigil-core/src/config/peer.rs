//! Participant (peer service) configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::ConfigError;

/// Configuration for a participant service.
///
/// A participant calls other participants (the `peers`) and accepts calls
/// from the identities listed in `trusted_callers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Bind address, e.g. "0.0.0.0:3000".
    #[serde(default = "default_bind")]
    pub bind: String,

    /// This participant's identity. Used as `sub` on outbound tokens and as
    /// the expected `aud` on inbound ones.
    #[serde(default)]
    pub identity: String,

    /// Issuer used for self-signed (direct peer) tokens.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Base URL of the token authority.
    #[serde(default = "default_authority_endpoint")]
    pub authority_endpoint: String,

    /// Known peers: identity -> base URL.
    #[serde(default)]
    pub peers: BTreeMap<String, String>,

    /// Outbound targets, in call order. Single-hop flows use the first one.
    /// Empty means every configured peer.
    #[serde(default)]
    pub targets: Vec<String>,

    /// Identities whose tokens this participant accepts.
    #[serde(default)]
    pub trusted_callers: Vec<String>,

    /// Directory with this participant's private key and the public keys of
    /// trusted callers, for the direct peer model.
    #[serde(default = "default_keys_dir")]
    pub keys_dir: PathBuf,

    /// Lifetime of self-signed tokens, in seconds.
    #[serde(default = "default_validity_secs")]
    pub validity_secs: u64,

    /// Per-request timeout for outbound calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_issuer() -> String {
    "https://service-issuer".to_string()
}

fn default_authority_endpoint() -> String {
    "http://localhost:5555".to_string()
}

fn default_keys_dir() -> PathBuf {
    PathBuf::from("./scenario-keys")
}

fn default_validity_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            identity: String::new(),
            issuer: default_issuer(),
            authority_endpoint: default_authority_endpoint(),
            peers: BTreeMap::new(),
            targets: Vec::new(),
            trusted_callers: Vec::new(),
            keys_dir: default_keys_dir(),
            validity_secs: default_validity_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl PeerConfig {
    /// Outbound targets in call order.
    pub fn resolved_targets(&self) -> Vec<String> {
        if self.targets.is_empty() {
            self.peers.keys().cloned().collect()
        } else {
            self.targets.clone()
        }
    }

    /// Base URL for a peer, without a trailing slash.
    pub fn endpoint_for(&self, identity: &str) -> Option<&str> {
        self.peers
            .get(identity)
            .map(|url| url.trim_end_matches('/'))
    }

    /// Whether tokens claiming to come from `identity` are accepted.
    pub fn trusts(&self, identity: &str) -> bool {
        self.trusted_callers.iter().any(|c| c == identity)
    }

    /// Check the settings a running participant cannot do without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.trim().is_empty() {
            return Err(ConfigError::Config("peer.identity must be set".to_string()));
        }
        for (i, target) in self.targets.iter().enumerate() {
            if self.targets[..i].contains(target) {
                return Err(ConfigError::Config(format!(
                    "target '{}' is listed more than once in peer.targets",
                    target
                )));
            }
            if !self.peers.contains_key(target) {
                return Err(ConfigError::Config(format!(
                    "target '{}' has no entry in peer.peers",
                    target
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer_with(peers: &[(&str, &str)]) -> PeerConfig {
        PeerConfig {
            identity: "servicea".to_string(),
            peers: peers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..PeerConfig::default()
        }
    }

    #[test]
    fn test_targets_default_to_all_peers() {
        let cfg = peer_with(&[("servicec", "http://c"), ("serviceb", "http://b")]);
        assert_eq!(cfg.resolved_targets(), vec!["serviceb", "servicec"]);
    }

    #[test]
    fn test_explicit_targets_keep_order() {
        let mut cfg = peer_with(&[("serviceb", "http://b"), ("servicec", "http://c")]);
        cfg.targets = vec!["servicec".into(), "serviceb".into()];
        assert_eq!(cfg.resolved_targets(), vec!["servicec", "serviceb"]);
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let cfg = peer_with(&[("serviceb", "http://b:3000/")]);
        assert_eq!(cfg.endpoint_for("serviceb"), Some("http://b:3000"));
        assert_eq!(cfg.endpoint_for("ghost"), None);
    }

    #[test]
    fn test_validate_requires_identity() {
        let cfg = PeerConfig::default();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_target() {
        let mut cfg = peer_with(&[("serviceb", "http://b")]);
        cfg.targets = vec!["servicez".into()];
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("servicez"));
    }

    #[test]
    fn test_validate_rejects_duplicate_targets() {
        let mut cfg = peer_with(&[("serviceb", "http://b"), ("servicec", "http://c")]);
        cfg.targets = vec!["serviceb".into(), "servicec".into(), "serviceb".into()];
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));

        cfg.targets = vec!["serviceb".into(), "servicec".into()];
        assert!(cfg.validate().is_ok());
    }
}
