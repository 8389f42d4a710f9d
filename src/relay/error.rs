//! Relay error types

use std::time::Duration;
use thiserror::Error;

use crate::broadcast::BroadcastError;

/// Errors that can occur while relaying a webhook request
#[derive(Error, Debug)]
pub enum RelayError {
    /// Validation probe without a usable `Webhook-Request-Origin`
    #[error("{0}")]
    MissingHeader(String),

    /// Body larger than the configured limit
    #[error("Request body exceeds the limit of {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Body was not fully received in time
    #[error("Timed out reading request body after {0:?}")]
    BodyReadTimeout(Duration),

    /// Body stream failed mid-read
    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    /// Publishing the event to the hub failed
    #[error("Broadcast failed: {0}")]
    BroadcastFailure(#[from] BroadcastError),

    /// Method other than OPTIONS/POST while strict method handling is on
    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),
}

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;
