//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::negotiate::NegotiationError;
use crate::relay::RelayError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Webhook relay failed
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Credential issuance failed
    #[error("Negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),

    /// Missing or invalid hub access token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Errors the eventing service reads as text go back as plain text
        if let ApiError::Relay(relay_error) = &self {
            match relay_error {
                RelayError::MissingHeader(reason) => {
                    tracing::warn!(reason = %reason, "Rejecting validation request");
                    return (StatusCode::BAD_REQUEST, reason.clone()).into_response();
                }
                RelayError::BodyTooLarge { .. } => {
                    return (StatusCode::PAYLOAD_TOO_LARGE, relay_error.to_string()).into_response();
                }
                RelayError::BodyReadTimeout(_) => {
                    return (StatusCode::REQUEST_TIMEOUT, relay_error.to_string()).into_response();
                }
                RelayError::BodyRead(_) => {
                    return (StatusCode::BAD_REQUEST, relay_error.to_string()).into_response();
                }
                RelayError::MethodNotAllowed(_) => {
                    return (
                        StatusCode::METHOD_NOT_ALLOWED,
                        [(header::ALLOW, "OPTIONS, POST")],
                    )
                        .into_response();
                }
                RelayError::BroadcastFailure(_) => {}
            }
        }

        let (status, code) = match &self {
            ApiError::Relay(RelayError::BroadcastFailure(e)) if e.is_unavailable() => {
                (StatusCode::SERVICE_UNAVAILABLE, "BROADCAST_UNAVAILABLE")
            }
            ApiError::Relay(_) => (StatusCode::BAD_GATEWAY, "BROADCAST_FAILED"),
            ApiError::Negotiation(_) => (StatusCode::INTERNAL_SERVER_ERROR, "NEGOTIATION_FAILED"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        };

        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(request_id = %request_id, error_code = %code, "Request rejected");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
