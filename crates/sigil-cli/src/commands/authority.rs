//! `sigil authority` - Run the central token authority.

use anyhow::Context;
use sigil_authority::AuthorityServer;
use sigil_core::{AuthorityConfig, SigilConfig};
use std::path::{Path, PathBuf};

/// Command-line values that win over the configuration file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub keys_dir: Option<PathBuf>,
    pub issuer: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut AuthorityConfig) {
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(port) = self.port {
            config.bind = super::with_port(&config.bind, port);
        }
        if let Some(keys_dir) = self.keys_dir {
            config.keys_dir = keys_dir;
        }
        if let Some(issuer) = self.issuer {
            config.issuer = issuer;
        }
    }
}

/// Resolve the authority configuration from file plus overrides.
pub fn resolve(config_path: Option<&Path>, overrides: Overrides) -> anyhow::Result<AuthorityConfig> {
    let mut config = SigilConfig::load(config_path)
        .context("Failed to load configuration")?
        .authority;
    overrides.apply(&mut config);
    Ok(config)
}

pub async fn run(config_path: Option<&Path>, overrides: Overrides) -> anyhow::Result<()> {
    let config = resolve(config_path, overrides)?;
    AuthorityServer::new(config)
        .run()
        .await
        .context("Authority failed")
}
