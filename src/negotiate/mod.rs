//! Connection Negotiation
//!
//! Clients call `POST /negotiate` once to learn where the hub lives and get a
//! short-lived access token for it. Issuance is stateless: the token is a
//! signed JWT, so no record of it is kept and negotiations never affect the
//! relay.

mod provider;
mod token;

pub use provider::{client_url, TokenNegotiator};
pub use token::{AccessClaims, AccessTokenIssuer, IssuedToken, TokenError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connection info returned to a negotiating client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCredential {
    /// Hub endpoint the client connects to
    pub url: String,
    /// Bearer token for that endpoint
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues connection credentials for a hub channel
#[async_trait]
pub trait ConnectionInfoProvider: Send + Sync {
    async fn negotiate(&self, channel: &str) -> Result<ConnectionCredential, NegotiationError>;
}

/// Errors that can occur during negotiation
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("Channel name cannot be empty")]
    EmptyChannel,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}
