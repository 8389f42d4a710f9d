//! # Beacon
//!
//! CloudEvents webhook relay - receives events pushed by an eventing service
//! and broadcasts each one to every client connected to a realtime hub.
//!
//! ## Features
//!
//! - **Webhook validation**: Answers the CloudEvents abuse-protection handshake
//! - **Event fan-out**: Publishes each delivered event unchanged to a hub channel
//! - **Negotiation**: Issues signed connection credentials to browser clients
//! - **Local hub**: Built-in WebSocket hub, or publish to an external service
//!
//! ## Modules
//!
//! - [`relay`]: Webhook request handling
//! - [`broadcast`]: Publishing backends
//! - [`negotiate`]: Access tokens and connection credentials
//! - [`websocket`]: In-process WebSocket hub
//! - [`api`]: HTTP server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use beacon::{serve, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default()?;
//!     config.validate()?;
//!
//!     let server = config.server.clone();
//!     let state = AppState::from_config(config)?;
//!     serve(state, &server).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod broadcast;
pub mod config;
pub mod negotiate;
pub mod relay;
pub mod websocket;

// Re-export top-level types for convenience
pub use relay::{
    BroadcastMessage, EventRelay, InboundRequest, RelayConfig, RelayError, RelayResponse,
    RequestMethod,
};

pub use broadcast::{BroadcastError, Broadcaster, HubBroadcaster, RestBroadcaster};

pub use negotiate::{
    AccessTokenIssuer, ConnectionCredential, ConnectionInfoProvider, NegotiationError,
    TokenNegotiator,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage};

pub use config::{BroadcastMode, Config, ConfigError, LoggingConfig};
