//! Authority server implementation.

use crate::api;
use crate::authority::Authority;
use crate::error::AuthorityError;
use sigil_core::AuthorityConfig;
use std::sync::Arc;
use tokio::net::TcpListener;

/// The authority server.
pub struct AuthorityServer {
    config: AuthorityConfig,
}

impl AuthorityServer {
    /// Create a new authority server with the given configuration.
    pub fn new(config: AuthorityConfig) -> Self {
        Self { config }
    }

    /// Load keys, bind, and serve until Ctrl+C.
    pub async fn run(&self) -> Result<(), AuthorityError> {
        let authority = Arc::new(Authority::from_config(&self.config)?);
        let app = api::create_router(authority);

        let listener = TcpListener::bind(&self.config.bind).await.map_err(|e| {
            AuthorityError::StartupFailed(format!("failed to bind {}: {}", self.config.bind, e))
        })?;
        tracing::info!(address = %self.config.bind, "Starting Sigil authority");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AuthorityError::Internal(e.into()))?;

        tracing::info!("Authority stopped");
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
