//! Shared participant state.

use crate::authority_client::{HttpAuthorityClient, TokenAuthority};
use crate::direct::DirectTrust;
use crate::error::PeerError;
use sigil_core::PeerConfig;
use std::sync::Arc;
use std::time::Duration;

/// Everything a participant's handlers need.
#[derive(Clone)]
pub struct PeerState {
    inner: Arc<PeerStateInner>,
}

struct PeerStateInner {
    config: PeerConfig,
    authority: Arc<dyn TokenAuthority>,
    direct: DirectTrust,
    http: reqwest::Client,
}

impl PeerState {
    /// Build state from configuration, talking to the configured authority over HTTP.
    pub fn from_config(config: PeerConfig) -> Result<Self, PeerError> {
        let http = build_client(&config)?;
        let authority = HttpAuthorityClient::with_client(&config.authority_endpoint, http.clone());
        Self::with_authority(config, Arc::new(authority), http)
    }

    /// Build state around a given authority.
    pub fn with_authority(
        config: PeerConfig,
        authority: Arc<dyn TokenAuthority>,
        http: reqwest::Client,
    ) -> Result<Self, PeerError> {
        config.validate()?;
        let direct = DirectTrust::from_config(&config)?;
        tracing::info!(
            identity = %config.identity,
            targets = ?config.resolved_targets(),
            trusted_callers = ?config.trusted_callers,
            "Participant ready"
        );
        Ok(Self {
            inner: Arc::new(PeerStateInner {
                config,
                authority,
                direct,
                http,
            }),
        })
    }

    pub fn config(&self) -> &PeerConfig {
        &self.inner.config
    }

    /// This participant's identity.
    pub fn identity(&self) -> &str {
        &self.inner.config.identity
    }

    pub fn authority(&self) -> &dyn TokenAuthority {
        self.inner.authority.as_ref()
    }

    pub fn direct(&self) -> &DirectTrust {
        &self.inner.direct
    }

    /// Client for outbound calls to other participants.
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}

/// An HTTP client honoring the configured per-request timeout.
pub fn build_client(config: &PeerConfig) -> Result<reqwest::Client, PeerError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?)
}
