//! Negotiate Route
//!
//! - POST /negotiate - Connection credential for the hub

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::negotiate::ConnectionCredential;

/// POST /negotiate
///
/// Anonymous. The request body is ignored.
pub async fn negotiate(State(state): State<Arc<AppState>>) -> ApiResult<Json<ConnectionCredential>> {
    let channel = &state.config.relay.negotiation_channel_name;
    let credential = state.negotiator.negotiate(channel).await?;
    Ok(Json(credential))
}
