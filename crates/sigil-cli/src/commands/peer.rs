//! `sigil peer` - Run a participant service.

use anyhow::Context;
use sigil_core::{PeerConfig, SigilConfig};
use sigil_peer::PeerServer;
use std::path::{Path, PathBuf};

/// Command-line values that win over the configuration file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub identity: Option<String>,
    pub authority_endpoint: Option<String>,
    pub keys_dir: Option<PathBuf>,
    pub issuer: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut PeerConfig) {
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(port) = self.port {
            config.bind = super::with_port(&config.bind, port);
        }
        if let Some(identity) = self.identity {
            config.identity = identity;
        }
        if let Some(endpoint) = self.authority_endpoint {
            config.authority_endpoint = endpoint;
        }
        if let Some(keys_dir) = self.keys_dir {
            config.keys_dir = keys_dir;
        }
        if let Some(issuer) = self.issuer {
            config.issuer = issuer;
        }
    }
}

/// Resolve the participant configuration from file plus overrides.
pub fn resolve(config_path: Option<&Path>, overrides: Overrides) -> anyhow::Result<PeerConfig> {
    let mut config = SigilConfig::load(config_path)
        .context("Failed to load configuration")?
        .peer;
    overrides.apply(&mut config);
    config.validate().context("Invalid peer configuration")?;
    Ok(config)
}

pub async fn run(config_path: Option<&Path>, overrides: Overrides) -> anyhow::Result<()> {
    let config = resolve(config_path, overrides)?;
    PeerServer::new(config).run().await.context("Peer failed")
}
