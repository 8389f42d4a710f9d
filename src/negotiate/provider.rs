//! Token-based connection info provider

use async_trait::async_trait;
use std::sync::Arc;

use super::token::AccessTokenIssuer;
use super::{ConnectionCredential, ConnectionInfoProvider, NegotiationError};

/// Client endpoint for `channel` under `base_url`
///
/// This is also the audience of the client's access token.
pub fn client_url(base_url: &str, channel: &str) -> String {
    format!(
        "{}/client/?hub={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(channel)
    )
}

/// Issues signed credentials pointing at a hub endpoint
///
/// The endpoint is either this process (local hub) or the external realtime
/// service; both accept tokens signed with the same access key.
pub struct TokenNegotiator {
    base_url: String,
    issuer: Arc<AccessTokenIssuer>,
}

impl TokenNegotiator {
    pub fn new(base_url: impl Into<String>, issuer: Arc<AccessTokenIssuer>) -> Self {
        Self {
            base_url: base_url.into(),
            issuer,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ConnectionInfoProvider for TokenNegotiator {
    async fn negotiate(&self, channel: &str) -> Result<ConnectionCredential, NegotiationError> {
        if channel.trim().is_empty() {
            return Err(NegotiationError::EmptyChannel);
        }

        let url = client_url(&self.base_url, channel);
        let issued = self.issuer.issue(&url)?;

        tracing::debug!(channel = %channel, expires_at = %issued.expires_at, "Issued connection credential");

        Ok(ConnectionCredential {
            url,
            access_token: issued.token,
            expires_at: issued.expires_at,
        })
    }
}
