//! HTTP surface of the authority.

mod handlers;
pub mod types;

use crate::authority::Authority;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use types::{DumpResponse, PublicKeyResponse, VerifyRequest};

/// Create the authority router.
pub fn create_router(authority: Arc<Authority>) -> Router {
    Router::new()
        .route("/keys/{identity}", post(handlers::register))
        .route("/issueToken/{identity}", post(handlers::issue_token))
        .route("/verify/{identity}", post(handlers::verify))
        .route("/utils/publicKey/{identity}", get(handlers::public_key))
        .route("/utils/keys", get(handlers::list_identities))
        .route("/utils/dump", post(handlers::dump))
        .route("/healthz", get(handlers::health))
        .with_state(authority)
        .layer(TraceLayer::new_for_http())
}
