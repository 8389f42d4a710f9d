//! Event Relay
//!
//! Orchestrates a single webhook request: validation probes are answered by
//! the [`HandshakeValidator`], deliveries are wrapped in a
//! [`BroadcastMessage`] and published exactly once to the configured channel.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::error::{RelayError, RelayResult};
use super::handshake::{
    HandshakeValidator, ValidationOutcome, ALLOWED_ORIGIN_HEADER, ALLOWED_RATE_HEADER,
};
use super::message::{BroadcastMessage, DEFAULT_EVENT_TARGET};
use super::request::{InboundRequest, RequestMethod};
use crate::broadcast::{BroadcastError, Broadcaster};

/// Hub every relayed event is published to, and clients negotiate for
pub const DEFAULT_CHANNEL: &str = "cloudEventSchemaHub";

/// Relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Channel deliveries are published to
    #[serde(default = "default_channel")]
    pub channel_name: String,

    /// Channel clients receive credentials for on `/negotiate`
    #[serde(default = "default_channel")]
    pub negotiation_channel_name: String,

    /// Client method invoked with each event
    #[serde(default = "default_event_target")]
    pub event_target: String,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Time allowed to receive the whole request body, in milliseconds
    #[serde(default = "default_body_read_timeout")]
    pub body_read_timeout_ms: u64,

    /// Time allowed for one publish to the broadcaster, in milliseconds
    #[serde(default = "default_publish_timeout")]
    pub publish_timeout_ms: u64,

    /// Answer methods other than OPTIONS/POST with 405 instead of 200
    #[serde(default)]
    pub reject_unhandled_methods: bool,

    /// `WebHook-Allowed-Rate` returned to probes that send `WebHook-Request-Rate`
    #[serde(default)]
    pub allowed_rate: Option<String>,
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

fn default_event_target() -> String {
    DEFAULT_EVENT_TARGET.to_string()
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1 MiB
}

fn default_body_read_timeout() -> u64 {
    10_000
}

fn default_publish_timeout() -> u64 {
    5_000
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            channel_name: default_channel(),
            negotiation_channel_name: default_channel(),
            event_target: default_event_target(),
            max_body_size: default_max_body_size(),
            body_read_timeout_ms: default_body_read_timeout(),
            publish_timeout_ms: default_publish_timeout(),
            reject_unhandled_methods: false,
            allowed_rate: None,
        }
    }
}

impl RelayConfig {
    pub fn body_read_timeout(&self) -> Duration {
        Duration::from_millis(self.body_read_timeout_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

/// Plain response record produced by the relay
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RelayResponse {
    /// 200 with no headers and an empty body
    pub fn ok() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        response.headers_mut().extend(self.headers);
        response
    }
}

/// Webhook-to-broadcast relay
pub struct EventRelay {
    config: RelayConfig,
    validator: HandshakeValidator,
    broadcaster: Arc<dyn Broadcaster>,
}

impl EventRelay {
    pub fn new(config: RelayConfig, broadcaster: Arc<dyn Broadcaster>) -> Self {
        let validator = HandshakeValidator::new(config.allowed_rate.clone());
        Self {
            config,
            validator,
            broadcaster,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Name of the broadcaster backing this relay
    pub fn broadcaster_name(&self) -> &str {
        self.broadcaster.name()
    }

    /// Handle one fully received request
    pub async fn handle(&self, request: &InboundRequest) -> RelayResult<RelayResponse> {
        match request.method() {
            RequestMethod::Options => self.answer_probe(request),
            RequestMethod::Post => self.relay_event(request).await,
            RequestMethod::Other(method) => self.unhandled(method),
        }
    }

    fn answer_probe(&self, request: &InboundRequest) -> RelayResult<RelayResponse> {
        match self.validator.validate(request) {
            Some(ValidationOutcome::Approved {
                echoed_origin,
                allowed_rate,
            }) => {
                tracing::info!(origin = ?echoed_origin, "Subscription validation approved");

                let mut response = RelayResponse::ok();
                response.headers.insert(
                    header::HeaderName::from_static(ALLOWED_ORIGIN_HEADER),
                    echoed_origin,
                );
                if let Some(rate) = allowed_rate {
                    insert_header(&mut response.headers, ALLOWED_RATE_HEADER, &rate);
                }

                Ok(response)
            }
            Some(ValidationOutcome::Rejected { reason }) => {
                tracing::warn!(reason = %reason, "Subscription validation rejected");
                Err(RelayError::MissingHeader(reason))
            }
            None => Ok(RelayResponse::ok()),
        }
    }

    async fn relay_event(&self, request: &InboundRequest) -> RelayResult<RelayResponse> {
        let payload = request.payload();
        let payload_bytes = payload.len();
        let message = BroadcastMessage::event(&self.config.event_target, payload);
        let channel = &self.config.channel_name;
        let timeout = self.config.publish_timeout();

        let published =
            tokio::time::timeout(timeout, self.broadcaster.publish(channel, &message)).await;

        match published {
            Ok(Ok(())) => {
                tracing::debug!(
                    channel = %channel,
                    target = %message.target,
                    payload_bytes,
                    "Event relayed"
                );
                Ok(RelayResponse::ok())
            }
            Ok(Err(e)) => {
                tracing::error!(channel = %channel, error = %e, "Event publish failed");
                Err(RelayError::BroadcastFailure(e))
            }
            Err(_) => {
                tracing::error!(channel = %channel, timeout_ms = self.config.publish_timeout_ms, "Event publish timed out");
                Err(RelayError::BroadcastFailure(BroadcastError::Timeout(timeout)))
            }
        }
    }

    fn unhandled(&self, method: &str) -> RelayResult<RelayResponse> {
        if self.config.reject_unhandled_methods {
            return Err(RelayError::MethodNotAllowed(method.to_string()));
        }
        tracing::debug!(method = %method, "Ignoring request with unhandled method");
        Ok(RelayResponse::ok())
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(header::HeaderName::from_static(name), value);
        }
        Err(_) => tracing::warn!(header = name, "Skipping response header with invalid value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::testing::RecordingBroadcaster;
    use crate::relay::handshake::MISSING_ORIGIN_REASON;

    fn relay_with(broadcaster: Arc<RecordingBroadcaster>) -> EventRelay {
        EventRelay::new(RelayConfig::default(), broadcaster)
    }

    #[tokio::test]
    async fn test_options_echoes_origin() {
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let relay = relay_with(Arc::clone(&broadcaster));

        let request = InboundRequest::options().header("Webhook-Request-Origin", "https://example.com");
        let response = relay.handle(&request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers.get("Webhook-Allowed-Origin").unwrap(), "https://example.com");
        assert!(response.body.is_empty());
        assert_eq!(broadcaster.publish_count(), 0);
    }

    #[tokio::test]
    async fn test_options_echoes_non_ascii_origin_bytes() {
        let relay = relay_with(Arc::new(RecordingBroadcaster::new()));

        let origin = HeaderValue::from_bytes("https://exämple.com".as_bytes()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("webhook-request-origin", origin.clone());
        let request = InboundRequest::new(RequestMethod::Options, headers, "");

        let response = relay.handle(&request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers.get("Webhook-Allowed-Origin"), Some(&origin));
    }

    #[tokio::test]
    async fn test_options_without_origin_is_missing_header() {
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let relay = relay_with(Arc::clone(&broadcaster));

        let err = relay.handle(&InboundRequest::options()).await.unwrap_err();

        match err {
            RelayError::MissingHeader(reason) => assert_eq!(reason, MISSING_ORIGIN_REASON),
            other => panic!("Expected MissingHeader, got {:?}", other),
        }
        assert_eq!(broadcaster.publish_count(), 0);
    }

    #[tokio::test]
    async fn test_options_sets_allowed_rate() {
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let config = RelayConfig {
            allowed_rate: Some("*".to_string()),
            ..RelayConfig::default()
        };
        let relay = EventRelay::new(config, broadcaster);

        let request = InboundRequest::options()
            .header("Webhook-Request-Origin", "eventgrid.azure.net")
            .header("WebHook-Request-Rate", "120");
        let response = relay.handle(&request).await.unwrap();

        assert_eq!(response.headers.get("WebHook-Allowed-Rate").unwrap(), "*");
    }

    #[tokio::test]
    async fn test_post_publishes_payload_once() {
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let relay = relay_with(Arc::clone(&broadcaster));

        let response = relay.handle(&InboundRequest::post(r#"{"id":"1"}"#)).await.unwrap();

        assert_eq!(response, RelayResponse::ok());
        let published = broadcaster.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "cloudEventSchemaHub");
        assert_eq!(published[0].1.target, "newEvent");
        assert_eq!(published[0].1.arguments, vec![r#"{"id":"1"}"#.to_string()]);
    }

    #[tokio::test]
    async fn test_post_with_empty_body_still_publishes() {
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let relay = relay_with(Arc::clone(&broadcaster));

        let response = relay.handle(&InboundRequest::post("")).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(broadcaster.published()[0].1.arguments, vec![String::new()]);
    }

    #[tokio::test]
    async fn test_post_to_custom_channel() {
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let config = RelayConfig {
            channel_name: "orders".to_string(),
            event_target: "orderPlaced".to_string(),
            ..RelayConfig::default()
        };
        let relay = EventRelay::new(config, Arc::clone(&broadcaster) as Arc<dyn Broadcaster>);

        relay.handle(&InboundRequest::post("{}")).await.unwrap();

        let published = broadcaster.published();
        assert_eq!(published[0].0, "orders");
        assert_eq!(published[0].1.target, "orderPlaced");
    }

    #[tokio::test]
    async fn test_publish_failure_is_surfaced() {
        let broadcaster = Arc::new(RecordingBroadcaster::failing(|| {
            BroadcastError::Unavailable("hub offline".to_string())
        }));
        let relay = relay_with(Arc::clone(&broadcaster));

        let err = relay.handle(&InboundRequest::post("{}")).await.unwrap_err();

        assert!(matches!(
            err,
            RelayError::BroadcastFailure(BroadcastError::Unavailable(_))
        ));
        assert_eq!(broadcaster.publish_count(), 1);
    }

    #[tokio::test]
    async fn test_publish_timeout() {
        let broadcaster = Arc::new(RecordingBroadcaster::slow(Duration::from_secs(5)));
        let config = RelayConfig {
            publish_timeout_ms: 20,
            ..RelayConfig::default()
        };
        let relay = EventRelay::new(config, Arc::clone(&broadcaster) as Arc<dyn Broadcaster>);

        let err = relay.handle(&InboundRequest::post("{}")).await.unwrap_err();

        assert!(matches!(
            err,
            RelayError::BroadcastFailure(BroadcastError::Timeout(_))
        ));
        assert_eq!(broadcaster.publish_count(), 1);
    }

    #[tokio::test]
    async fn test_other_methods_fall_through() {
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let relay = relay_with(Arc::clone(&broadcaster));

        let request = InboundRequest::new(RequestMethod::Other("GET".to_string()), HeaderMap::new(), "{}");
        let response = relay.handle(&request).await.unwrap();

        assert_eq!(response, RelayResponse::ok());
        assert_eq!(broadcaster.publish_count(), 0);
    }

    #[tokio::test]
    async fn test_other_methods_rejected_when_strict() {
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let config = RelayConfig {
            reject_unhandled_methods: true,
            ..RelayConfig::default()
        };
        let relay = EventRelay::new(config, Arc::clone(&broadcaster) as Arc<dyn Broadcaster>);

        let request = InboundRequest::new(RequestMethod::Other("PUT".to_string()), HeaderMap::new(), "{}");
        let err = relay.handle(&request).await.unwrap_err();

        assert!(matches!(err, RelayError::MethodNotAllowed(m) if m == "PUT"));
        assert_eq!(broadcaster.publish_count(), 0);
    }
}
