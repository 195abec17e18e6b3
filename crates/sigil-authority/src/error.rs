//! Error types for the authority crate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sigil_token::TokenError;
use thiserror::Error;

/// Errors that can occur in the authority.
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// No key pair exists for the identity.
    #[error("key not found: {0}")]
    UnknownIdentity(String),

    /// The identity path segment was blank.
    #[error("no identity specified")]
    MissingIdentity,

    /// Issue request without an audience.
    #[error("no audience specified")]
    MissingAudience,

    /// Invalid request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Key or signing failure.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Failed to start the server.
    #[error("failed to start authority: {0}")]
    StartupFailed(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthorityError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthorityError::UnknownIdentity(_) => StatusCode::NOT_FOUND,
            AuthorityError::MissingIdentity
            | AuthorityError::MissingAudience
            | AuthorityError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuthorityError::Token(TokenError::EmptyIdentity | TokenError::InvalidIdentity(_)) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthorityError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AuthorityError::UnknownIdentity("ghost".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AuthorityError::MissingAudience.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthorityError::Token(TokenError::Signing("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
