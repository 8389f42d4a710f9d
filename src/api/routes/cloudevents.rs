//! CloudEvents Webhook Route
//!
//! - OPTIONS /cloudevents - Subscription validation handshake
//! - POST /cloudevents - Event delivery, relayed to the hub
//!
//! Every other method reaches the relay too, which decides between 200 and
//! 405.

use axum::extract::{Request, State};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::relay::{InboundRequest, RelayResponse};

/// ANY /cloudevents
pub async fn receive(State(state): State<Arc<AppState>>, request: Request) -> ApiResult<RelayResponse> {
    let inbound = InboundRequest::from_http(request, state.relay.config()).await?;
    let response = state.relay.handle(&inbound).await?;
    Ok(response)
}
