//! WebSocket Connection Hub
//!
//! Tracks connected clients and the hub channel each one joined, and fans
//! invocations out to every client of a channel.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::ServerMessage;

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all WebSocket connections and their channels
pub struct ConnectionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    /// Channel membership: channel → set of ConnectionIds
    channels: RwLock<HashMap<String, HashSet<ConnectionId>>>,
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_max_connections() -> usize {
    1000
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    /// Channel sender for this connection
    pub sender: mpsc::UnboundedSender<ServerMessage>,
    /// Hub channel this connection joined
    pub channel: String,
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register a connection as a member of `channel`
    ///
    /// Returns the connection ID, or an error if the connection limit has
    /// been reached.
    pub async fn register(
        &self,
        channel: &str,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        // lock order: channels before connections, same as broadcast
        let mut channels = self.channels.write().await;
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                channel: channel.to_string(),
            },
        );
        channels
            .entry(channel.to_string())
            .or_default()
            .insert(id.clone());

        tracing::info!(connection_id = %id, channel = %channel, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection and drop it from its channel
    pub async fn unregister(&self, id: &str) {
        let handle = self.connections.write().await.remove(id);

        if let Some(handle) = handle {
            let mut channels = self.channels.write().await;
            if let Some(members) = channels.get_mut(&handle.channel) {
                members.remove(id);
                if members.is_empty() {
                    channels.remove(&handle.channel);
                }
            }
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Send `message` to every member of `channel`
    ///
    /// Returns the number of connections the message was queued for.
    /// Connections whose receiver has gone away are skipped.
    pub async fn broadcast(&self, channel: &str, message: &ServerMessage) -> usize {
        let channels = self.channels.read().await;
        let Some(members) = channels.get(channel) else {
            return 0;
        };

        let connections = self.connections.read().await;
        let mut sent = 0;
        for id in members {
            if let Some(handle) = connections.get(id) {
                if handle.sender.send(message.clone()).is_ok() {
                    sent += 1;
                }
            }
        }

        tracing::trace!(channel = %channel, subscribers = sent, "Broadcast");
        sent
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle
            .sender
            .send(message)
            .map_err(|_| HubError::SendFailed)
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of connections in a channel
    pub async fn channel_size(&self, channel: &str) -> usize {
        self.channels
            .read()
            .await
            .get(channel)
            .map(|members| members.len())
            .unwrap_or(0)
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}
