//! HTTP surface of a participant.

mod handlers;

use crate::state::PeerState;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

/// Create the participant router.
pub fn create_router(state: PeerState) -> Router {
    Router::new()
        .route("/authority/call", get(handlers::authority_call))
        .route("/authority/fan-out", get(handlers::authority_fan_out))
        .route("/authority/receive", get(handlers::authority_receive))
        .route("/direct/call", get(handlers::direct_call))
        .route("/direct/fan-out", get(handlers::direct_fan_out))
        .route("/direct/receive", get(handlers::direct_receive))
        .route("/healthz", get(handlers::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
