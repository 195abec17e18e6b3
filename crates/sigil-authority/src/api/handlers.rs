//! Request handlers for the authority.

use super::types::{DumpResponse, IssueQuery, PublicKeyResponse, VerifyRequest, parse_body};
use crate::authority::Authority;
use crate::error::AuthorityError;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sigil_token::{ClaimRequest, ErrorKind, IssueOptions, VerificationResult};
use std::sync::Arc;

type AppState = Arc<Authority>;

/// `POST /keys/{identity}`: generate (or replace) a key pair.
pub async fn register(
    State(authority): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<PublicKeyResponse>, AuthorityError> {
    tracing::info!(identity = %identity, "Creating key pair");
    // RSA generation is CPU-bound.
    let pair = tokio::task::spawn_blocking(move || authority.register(&identity))
        .await
        .map_err(|e| AuthorityError::Internal(e.into()))??;

    Ok(Json(PublicKeyResponse {
        public_key: pair.public_key_base64(),
    }))
}

/// `POST /issueToken/{identity}`: issue a token signed with that identity's key.
pub async fn issue_token(
    State(authority): State<AppState>,
    Path(identity): Path<String>,
    Query(query): Query<IssueQuery>,
    body: Bytes,
) -> Result<String, AuthorityError> {
    let request: ClaimRequest = parse_body(&body)?;
    let options = IssueOptions {
        expired: query.expired(),
    };
    authority.issue(&identity, &request, options)
}

/// `POST /verify/{identity}`: verify a token against that identity's key.
pub async fn verify(
    State(authority): State<AppState>,
    Path(identity): Path<String>,
    body: Bytes,
) -> Result<Response, AuthorityError> {
    let request: VerifyRequest = parse_body(&body)?;
    let result = authority.verify(
        &identity,
        request.token.as_deref().unwrap_or_default(),
        request.aud.as_deref(),
        request.sub.as_deref(),
    );
    Ok((verification_status(&result), Json(result)).into_response())
}

/// HTTP status for a verification outcome.
pub fn verification_status(result: &VerificationResult) -> StatusCode {
    match result.error_kind() {
        None => StatusCode::OK,
        Some(ErrorKind::UnknownIdentity) => StatusCode::NOT_FOUND,
        Some(kind) if kind.is_missing_input() => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::FORBIDDEN,
    }
}

/// `GET /utils/publicKey/{identity}`
pub async fn public_key(
    State(authority): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<PublicKeyResponse>, AuthorityError> {
    Ok(Json(PublicKeyResponse {
        public_key: authority.public_key(&identity)?,
    }))
}

/// `GET /utils/keys`: registered identities, sorted.
pub async fn list_identities(State(authority): State<AppState>) -> Json<Vec<String>> {
    Json(authority.identities())
}

/// `POST /utils/dump`: write every key pair to the key directory.
pub async fn dump(State(authority): State<AppState>) -> Result<Json<DumpResponse>, AuthorityError> {
    let identities = authority.identities();
    let directory = tokio::task::spawn_blocking(move || authority.dump())
        .await
        .map_err(|e| AuthorityError::Internal(e.into()))??;

    Ok(Json(DumpResponse {
        directory: directory.display().to_string(),
        identities,
    }))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sigil-authority",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_status_mapping() {
        assert_eq!(
            verification_status(&VerificationResult::invalid(ErrorKind::UnknownIdentity, "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            verification_status(&VerificationResult::invalid(ErrorKind::MissingSubject, "x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            verification_status(&VerificationResult::invalid(ErrorKind::Expired, "x")),
            StatusCode::FORBIDDEN
        );
    }
}
