//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::api::error::ApiError;
use crate::broadcast::{Broadcaster, HubBroadcaster, RestBroadcaster, RestBroadcasterConfig};
use crate::config::{BroadcastMode, Config};
use crate::negotiate::{AccessTokenIssuer, ConnectionInfoProvider, TokenNegotiator};
use crate::relay::EventRelay;
use crate::websocket::ConnectionHub;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Webhook relay behind `/cloudevents`
    pub relay: Arc<EventRelay>,
    /// Credential issuer behind `/negotiate`
    pub negotiator: Arc<dyn ConnectionInfoProvider>,
    /// Signs and verifies hub access tokens
    pub tokens: Arc<AccessTokenIssuer>,
    /// In-process WebSocket hub
    pub hub: Arc<ConnectionHub>,
    pub config: Arc<Config>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    negotiator_base_url: String,
}

impl AppState {
    /// Wire up the relay, hub and negotiator for the configured broadcast mode
    pub fn from_config(mut config: Config) -> Result<Self, ApiError> {
        if config.negotiation.access_key.is_empty() {
            if config.broadcast.mode != BroadcastMode::Local {
                return Err(ApiError::Internal(
                    "negotiation.access_key is required in service mode".to_string(),
                ));
            }
            // local tokens never leave this process
            tracing::warn!("No access key configured, generating an ephemeral one");
            config.negotiation.access_key = uuid::Uuid::new_v4().simple().to_string();
        }

        let tokens = Arc::new(AccessTokenIssuer::new(
            &config.negotiation.access_key,
            config.negotiation.token_ttl(),
        ));
        let hub = Arc::new(ConnectionHub::new(config.hub.clone()));

        let (broadcaster, base_url): (Arc<dyn Broadcaster>, String) = match config.broadcast.mode {
            BroadcastMode::Local => (
                Arc::new(HubBroadcaster::new(Arc::clone(&hub))),
                config.server.public_base_url(),
            ),
            BroadcastMode::Service => {
                let endpoint = config.broadcast.endpoint.clone().ok_or_else(|| {
                    ApiError::Internal("broadcast.endpoint is required in service mode".to_string())
                })?;
                let rest = RestBroadcaster::new(
                    RestBroadcasterConfig {
                        endpoint: endpoint.clone(),
                        request_timeout: config.relay.publish_timeout(),
                    },
                    Arc::clone(&tokens),
                )
                .map_err(|e| ApiError::Internal(e.to_string()))?;
                (Arc::new(rest), endpoint.trim_end_matches('/').to_string())
            }
        };

        Ok(Self::assemble(config, hub, tokens, broadcaster, base_url))
    }

    /// Local-hub state publishing through a custom broadcaster
    pub fn with_broadcaster(config: Config, broadcaster: Arc<dyn Broadcaster>) -> Self {
        let tokens = Arc::new(AccessTokenIssuer::new(
            &config.negotiation.access_key,
            config.negotiation.token_ttl(),
        ));
        let hub = Arc::new(ConnectionHub::new(config.hub.clone()));
        let base_url = config.server.public_base_url();
        Self::assemble(config, hub, tokens, broadcaster, base_url)
    }

    fn assemble(
        config: Config,
        hub: Arc<ConnectionHub>,
        tokens: Arc<AccessTokenIssuer>,
        broadcaster: Arc<dyn Broadcaster>,
        base_url: String,
    ) -> Self {
        let relay = Arc::new(EventRelay::new(config.relay.clone(), broadcaster));
        let negotiator = Arc::new(TokenNegotiator::new(base_url.clone(), Arc::clone(&tokens)));

        Self {
            relay,
            negotiator,
            tokens,
            hub,
            config: Arc::new(config),
            start_time: Instant::now(),
            negotiator_base_url: base_url,
        }
    }

    /// Base URL negotiated client URLs are built on
    pub fn negotiator_base_url(&self) -> &str {
        &self.negotiator_base_url
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        self.hub.connection_count().await
    }
}
