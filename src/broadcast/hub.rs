//! In-process hub broadcaster

use async_trait::async_trait;
use std::sync::Arc;

use super::{BroadcastError, Broadcaster};
use crate::relay::BroadcastMessage;
use crate::websocket::{ConnectionHub, ServerMessage};

/// Publishes to WebSocket clients connected to this process
pub struct HubBroadcaster {
    hub: Arc<ConnectionHub>,
}

impl HubBroadcaster {
    pub fn new(hub: Arc<ConnectionHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl Broadcaster for HubBroadcaster {
    fn name(&self) -> &str {
        "local"
    }

    async fn publish(&self, channel: &str, message: &BroadcastMessage) -> Result<(), BroadcastError> {
        // an empty channel is not an error: events are only for whoever is
        // listening right now
        let delivered = self.hub.broadcast(channel, &ServerMessage::from(message)).await;
        tracing::debug!(channel = %channel, delivered, "Published to local hub");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::HubConfig;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_publish_delivers_invocation_to_channel() {
        let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.register("cloudEventSchemaHub", tx).await.unwrap();

        let broadcaster = HubBroadcaster::new(Arc::clone(&hub));
        let message = BroadcastMessage::event("newEvent", r#"{"id":"1"}"#.to_string());
        broadcaster.publish("cloudEventSchemaHub", &message).await.unwrap();

        match rx.try_recv().unwrap() {
            ServerMessage::Invocation { target, arguments } => {
                assert_eq!(target, "newEvent");
                assert_eq!(arguments, vec![r#"{"id":"1"}"#.to_string()]);
            }
            other => panic!("Expected Invocation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
        let broadcaster = HubBroadcaster::new(hub);

        let message = BroadcastMessage::event("newEvent", String::new());
        assert!(broadcaster.publish("cloudEventSchemaHub", &message).await.is_ok());
    }
}
