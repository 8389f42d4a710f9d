//! Broadcasters
//!
//! A [`Broadcaster`] publishes one named message to every subscriber of a
//! channel. Two backends are provided:
//!
//! - [`HubBroadcaster`]: the in-process WebSocket [`ConnectionHub`](crate::websocket::ConnectionHub)
//! - [`RestBroadcaster`]: an external realtime messaging service reached over
//!   its REST API

mod hub;
mod rest;

pub use hub::HubBroadcaster;
pub use rest::{RestBroadcaster, RestBroadcasterConfig};

use async_trait::async_trait;
use std::time::Duration;

use crate::relay::BroadcastMessage;

/// Sink for relayed events
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Short name used in logs and health output
    fn name(&self) -> &str;

    /// Publish `message` to all current subscribers of `channel`.
    ///
    /// Called at most once per delivery; implementations must not retry.
    async fn publish(&self, channel: &str, message: &BroadcastMessage) -> Result<(), BroadcastError>;
}

/// Errors that can occur while publishing
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("Realtime service unavailable: {0}")]
    Unavailable(String),

    #[error("Publish timed out after {0:?}")]
    Timeout(Duration),

    #[error("Realtime service rejected publish ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl BroadcastError {
    /// Whether the failure means the service could not be reached at all,
    /// as opposed to answering with an error
    pub fn is_unavailable(&self) -> bool {
        matches!(self, BroadcastError::Unavailable(_) | BroadcastError::Timeout(_))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    type ErrorFactory = Box<dyn Fn() -> BroadcastError + Send + Sync>;

    /// Records every publish; optionally fails or stalls
    pub struct RecordingBroadcaster {
        published: Mutex<Vec<(String, BroadcastMessage)>>,
        failure: Option<ErrorFactory>,
        delay: Option<Duration>,
    }

    impl RecordingBroadcaster {
        pub fn new() -> Self {
            Self {
                published: Mutex::new(Vec::new()),
                failure: None,
                delay: None,
            }
        }

        /// Fails every publish with the error built by `make_error`
        pub fn failing(make_error: impl Fn() -> BroadcastError + Send + Sync + 'static) -> Self {
            Self {
                failure: Some(Box::new(make_error)),
                ..Self::new()
            }
        }

        /// Sleeps for `delay` after recording
        pub fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new()
            }
        }

        pub fn published(&self) -> Vec<(String, BroadcastMessage)> {
            self.published.lock().unwrap().clone()
        }

        pub fn publish_count(&self) -> usize {
            self.published.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Broadcaster for RecordingBroadcaster {
        fn name(&self) -> &str {
            "recording"
        }

        async fn publish(&self, channel: &str, message: &BroadcastMessage) -> Result<(), BroadcastError> {
            self.published
                .lock()
                .unwrap()
                .push((channel.to_string(), message.clone()));

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            match &self.failure {
                Some(make_error) => Err(make_error()),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(BroadcastError::Unavailable("down".into()).is_unavailable());
        assert!(BroadcastError::Timeout(Duration::from_secs(1)).is_unavailable());
        assert!(!BroadcastError::Transport("reset".into()).is_unavailable());
        assert!(!BroadcastError::Rejected {
            status: 403,
            message: "forbidden".into()
        }
        .is_unavailable());
    }
}
