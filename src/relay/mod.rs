//! CloudEvents Webhook Relay
//!
//! The core of Beacon: turns webhook requests from an eventing service into
//! hub broadcasts.
//!
//! ## Flow
//!
//! 1. The HTTP layer reads the request to completion into an [`InboundRequest`]
//! 2. `OPTIONS` probes go to the [`HandshakeValidator`], which echoes
//!    `Webhook-Request-Origin` back as `Webhook-Allowed-Origin`
//! 3. `POST` deliveries become a [`BroadcastMessage`] (`newEvent` with the raw
//!    body as its only argument) published once to the configured channel
//! 4. Anything else is answered with 200 and ignored, or 405 when
//!    `reject_unhandled_methods` is set

mod engine;
mod error;
mod handshake;
mod message;
mod request;

pub use engine::{EventRelay, RelayConfig, RelayResponse, DEFAULT_CHANNEL};
pub use error::{RelayError, RelayResult};
pub use handshake::{
    HandshakeValidator, ValidationOutcome, ALLOWED_ORIGIN_HEADER, ALLOWED_RATE_HEADER,
    MISSING_ORIGIN_REASON, REQUEST_ORIGIN_HEADER, REQUEST_RATE_HEADER,
};
pub use message::{BroadcastMessage, EventPayload, DEFAULT_EVENT_TARGET};
pub use request::{InboundRequest, RequestMethod};
