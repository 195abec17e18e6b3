//! Participant server implementation.

use crate::api;
use crate::error::PeerError;
use crate::state::PeerState;
use sigil_core::PeerConfig;
use tokio::net::TcpListener;

/// A participant server.
pub struct PeerServer {
    config: PeerConfig,
}

impl PeerServer {
    pub fn new(config: PeerConfig) -> Self {
        Self { config }
    }

    /// Load keys, bind, and serve until Ctrl+C.
    pub async fn run(&self) -> Result<(), PeerError> {
        let state = PeerState::from_config(self.config.clone())?;
        let app = api::create_router(state);

        let listener = TcpListener::bind(&self.config.bind).await.map_err(|e| {
            PeerError::StartupFailed(format!("failed to bind {}: {}", self.config.bind, e))
        })?;
        tracing::info!(
            address = %self.config.bind,
            identity = %self.config.identity,
            authority = %self.config.authority_endpoint,
            "Starting Sigil peer"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| PeerError::Internal(e.into()))?;

        tracing::info!("Peer stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_identity_fails_startup() {
        let server = PeerServer::new(PeerConfig {
            bind: "127.0.0.1:0".into(),
            ..PeerConfig::default()
        });
        assert!(matches!(server.run().await, Err(PeerError::Config(_))));
    }
}
