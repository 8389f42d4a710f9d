//! External Realtime Service Broadcaster
//!
//! Publishes through the REST API of a hosted realtime messaging service:
//!
//! ```text
//! POST {endpoint}/api/v1/hubs/{channel}
//! Authorization: Bearer <token signed with the access key, aud = request URL>
//!
//! {"target": "newEvent", "arguments": ["..."]}
//! ```

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::{BroadcastError, Broadcaster};
use crate::negotiate::AccessTokenIssuer;
use crate::relay::BroadcastMessage;

/// Configuration for the REST broadcaster
#[derive(Debug, Clone)]
pub struct RestBroadcasterConfig {
    /// Service endpoint (e.g., "https://myhub.service.example.com")
    pub endpoint: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

/// Broadcaster backed by an external realtime messaging service
pub struct RestBroadcaster {
    client: Client,
    config: RestBroadcasterConfig,
    issuer: Arc<AccessTokenIssuer>,
}

impl RestBroadcaster {
    pub fn new(
        config: RestBroadcasterConfig,
        issuer: Arc<AccessTokenIssuer>,
    ) -> Result<Self, BroadcastError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BroadcastError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            issuer,
        })
    }

    /// Publish URL for a channel
    pub fn publish_url(&self, channel: &str) -> String {
        format!(
            "{}/api/v1/hubs/{}",
            self.config.endpoint.trim_end_matches('/'),
            urlencoding::encode(channel)
        )
    }
}

#[async_trait]
impl Broadcaster for RestBroadcaster {
    fn name(&self) -> &str {
        "service"
    }

    async fn publish(&self, channel: &str, message: &BroadcastMessage) -> Result<(), BroadcastError> {
        let url = self.publish_url(channel);
        let token = self
            .issuer
            .issue(&url)
            .map_err(|e| BroadcastError::Transport(e.to_string()))?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token.token)
            .json(message)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BroadcastError::Timeout(self.config.request_timeout)
                } else if e.is_connect() {
                    BroadcastError::Unavailable(e.to_string())
                } else {
                    BroadcastError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(channel = %channel, status = status.as_u16(), "Published to realtime service");
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(BroadcastError::Unavailable(text));
        }
        Err(BroadcastError::Rejected {
            status: status.as_u16(),
            message: text,
        })
    }
}
