//! WebSocket Message Types
//!
//! Frames exchanged between hub clients and the Beacon server.

use serde::{Deserialize, Serialize};

use crate::relay::BroadcastMessage;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected {
        /// Unique connection identifier
        connection_id: String,
        /// Hub channel the connection joined
        channel: String,
    },
    /// Invoke a client-side handler
    Invocation {
        target: String,
        arguments: Vec<String>,
    },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
}

impl From<&BroadcastMessage> for ServerMessage {
    fn from(message: &BroadcastMessage) -> Self {
        ServerMessage::Invocation {
            target: message.target.clone(),
            arguments: message.arguments.clone(),
        }
    }
}
