//! Error types for the peer crate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sigil_core::ConfigError;
use sigil_token::TokenError;
use thiserror::Error;

/// Errors that can occur in a participant service.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Key loading or local signing failure.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// No endpoint configured for a target.
    #[error("no endpoint configured for '{0}'")]
    UnknownTarget(String),

    /// The flow needs more targets than are configured.
    #[error("flow needs {needed} target(s), {configured} configured")]
    NotEnoughTargets { needed: usize, configured: usize },

    /// The authority answered with a non-success status.
    #[error("authority returned {status}: {body}")]
    AuthorityRejected { status: u16, body: String },

    /// Outbound HTTP failure (connect, timeout, decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to start the server.
    #[error("failed to start peer: {0}")]
    StartupFailed(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PeerError {
    pub fn status(&self) -> StatusCode {
        match self {
            PeerError::AuthorityRejected { .. } | PeerError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PeerError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(error = %self, "Request failed");
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let rejected = PeerError::AuthorityRejected {
            status: 404,
            body: "key not found: servicea".into(),
        };
        assert_eq!(rejected.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            PeerError::UnknownTarget("servicez".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
