//! Request handlers for a participant.

use crate::error::PeerError;
use crate::flows::{CallOutcome, FanOutReport, TrustModel};
use crate::state::PeerState;
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use sigil_authority::api::types::is_truthy;

/// `?expired=...` on caller routes: a flag for single calls, a target name for fan-out.
#[derive(Debug, Default, Deserialize)]
pub struct ExpiredQuery {
    #[serde(default)]
    pub expired: Option<String>,
}

impl ExpiredQuery {
    fn flag(&self) -> bool {
        is_truthy(self.expired.as_deref())
    }

    fn target(&self) -> Option<&str> {
        self.expired.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

pub async fn authority_call(
    State(state): State<PeerState>,
    Query(query): Query<ExpiredQuery>,
) -> Result<Response, PeerError> {
    single(&state, TrustModel::Authority, &query).await
}

pub async fn authority_fan_out(
    State(state): State<PeerState>,
    Query(query): Query<ExpiredQuery>,
) -> Result<Json<FanOutReport>, PeerError> {
    Ok(Json(state.fan_out(TrustModel::Authority, query.target()).await?))
}

pub async fn authority_receive(
    State(state): State<PeerState>,
    headers: HeaderMap,
) -> Result<Response, PeerError> {
    receive(&state, TrustModel::Authority, &headers).await
}

pub async fn direct_call(
    State(state): State<PeerState>,
    Query(query): Query<ExpiredQuery>,
) -> Result<Response, PeerError> {
    single(&state, TrustModel::Direct, &query).await
}

pub async fn direct_fan_out(
    State(state): State<PeerState>,
    Query(query): Query<ExpiredQuery>,
) -> Result<Json<FanOutReport>, PeerError> {
    Ok(Json(state.fan_out(TrustModel::Direct, query.target()).await?))
}

pub async fn direct_receive(
    State(state): State<PeerState>,
    headers: HeaderMap,
) -> Result<Response, PeerError> {
    receive(&state, TrustModel::Direct, &headers).await
}

/// Mirror the callee's status so a rejection reaches whoever started the flow.
async fn single(state: &PeerState, model: TrustModel, query: &ExpiredQuery) -> Result<Response, PeerError> {
    let outcome = state.call_single(model, query.flag()).await?;
    Ok((outcome_status(&outcome), Json(outcome)).into_response())
}

async fn receive(state: &PeerState, model: TrustModel, headers: &HeaderMap) -> Result<Response, PeerError> {
    let (status, result) = state.receive(model, headers).await?;
    Ok((status, Json(result)).into_response())
}

fn outcome_status(outcome: &CallOutcome) -> StatusCode {
    outcome
        .status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

pub async fn health(State(state): State<PeerState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sigil-peer",
        "identity": state.identity(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
