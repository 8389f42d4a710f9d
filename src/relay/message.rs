//! Broadcast Message Types

use serde::{Deserialize, Serialize};

/// Raw event body forwarded verbatim to hub clients
pub type EventPayload = String;

/// Client-side method name invoked for every relayed event
pub const DEFAULT_EVENT_TARGET: &str = "newEvent";

/// A named invocation fanned out to every subscriber of a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    /// Method name the client registers a handler for
    pub target: String,
    /// Positional arguments passed to the handler
    pub arguments: Vec<String>,
}

impl BroadcastMessage {
    /// Wrap a single event payload as the only argument
    pub fn event(target: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            target: target.into(),
            arguments: vec![payload],
        }
    }
}
