//! Access Tokens
//!
//! HS256 JWTs signed with the hub access key. The audience is the URL the
//! token is valid for, so a client token cannot be replayed against the
//! publish API and vice versa. Nothing is stored server-side.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Claims carried by every access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// URL the token grants access to
    pub aud: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
    /// Random per-token identity
    pub nameid: String,
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Errors that can occur while issuing or verifying tokens
#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Token expired")]
    Expired,

    #[error("Token is not valid for this URL")]
    InvalidAudience,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Signs and verifies access tokens with a shared key
pub struct AccessTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl AccessTokenIssuer {
    pub fn new(access_key: &str, ttl: std::time::Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(access_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(access_key.as_bytes()),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::hours(1)),
        }
    }

    /// Sign a token valid for `audience` until now + ttl
    pub fn issue(&self, audience: &str) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = AccessClaims {
            aud: audience.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            nameid: Uuid::new_v4().to_string(),
        };

        self.sign(&claims).map(|token| IssuedToken { token, expires_at })
    }

    /// Sign arbitrary claims
    pub fn sign(&self, claims: &AccessClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature, expiry and audience
    pub fn verify(&self, token: &str, audience: &str) -> Result<AccessClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidAudience => TokenError::InvalidAudience,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://localhost:7071/client/?hub=cloudEventSchemaHub";

    fn issuer() -> AccessTokenIssuer {
        AccessTokenIssuer::new("test-access-key", std::time::Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();
        let issued = issuer.issue(URL).unwrap();

        let claims = issuer.verify(&issued.token, URL).unwrap();
        assert_eq!(claims.aud, URL);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_tokens_are_unique() {
        let issuer = issuer();
        let a = issuer.issue(URL).unwrap();
        let b = issuer.issue(URL).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_wrong_audience() {
        let issuer = issuer();
        let issued = issuer.issue(URL).unwrap();

        let result = issuer.verify(&issued.token, "http://localhost:7071/client/?hub=other");
        assert_eq!(result, Err(TokenError::InvalidAudience));
    }

    #[test]
    fn test_wrong_key() {
        let issued = issuer().issue(URL).unwrap();
        let other = AccessTokenIssuer::new("another-key", std::time::Duration::from_secs(60));

        assert_eq!(other.verify(&issued.token, URL), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expired() {
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let token = issuer
            .sign(&AccessClaims {
                aud: URL.to_string(),
                iat: now - 7200,
                exp: now - 3600,
                nameid: "expired".to_string(),
            })
            .unwrap();

        assert_eq!(issuer.verify(&token, URL), Err(TokenError::Expired));
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            issuer().verify("not-a-jwt", URL),
            Err(TokenError::Invalid(_))
        ));
    }
}
