//! Subscription Validation Handshake
//!
//! Implements the abuse-protection handshake of the CloudEvents HTTP webhook
//! binding. The eventing service sends an `OPTIONS` probe carrying
//! `WebHook-Request-Origin`; the endpoint proves ownership by echoing the
//! origin back in `WebHook-Allowed-Origin`.

use axum::http::HeaderValue;

use super::request::{InboundRequest, RequestMethod};

pub const REQUEST_ORIGIN_HEADER: &str = "webhook-request-origin";
pub const ALLOWED_ORIGIN_HEADER: &str = "webhook-allowed-origin";
pub const REQUEST_RATE_HEADER: &str = "webhook-request-rate";
pub const ALLOWED_RATE_HEADER: &str = "webhook-allowed-rate";

/// Rejection reason returned to the probe when no usable origin was sent
pub const MISSING_ORIGIN_REASON: &str = "Missing 'Webhook-Request-Origin' header when validating";

/// Result of validating a probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Echo the origin back to the prober
    Approved {
        /// First `WebHook-Request-Origin` value, byte for byte
        echoed_origin: HeaderValue,
        /// Value for `WebHook-Allowed-Rate`, when the probe asked for one
        allowed_rate: Option<String>,
    },
    /// Refuse the subscription
    Rejected { reason: String },
}

/// Decides whether a validation probe is acceptable
#[derive(Debug, Clone, Default)]
pub struct HandshakeValidator {
    allowed_rate: Option<String>,
}

impl HandshakeValidator {
    pub fn new(allowed_rate: Option<String>) -> Self {
        Self { allowed_rate }
    }

    /// Validate an inbound request.
    ///
    /// Returns `None` for anything other than `OPTIONS`; deliveries are never
    /// validated.
    pub fn validate(&self, request: &InboundRequest) -> Option<ValidationOutcome> {
        if request.method() != &RequestMethod::Options {
            return None;
        }

        // obs-text is legal in header values, so blankness is judged on bytes
        let origin = request
            .first_header(REQUEST_ORIGIN_HEADER)
            .filter(|v| !v.as_bytes().iter().all(u8::is_ascii_whitespace));

        let outcome = match origin {
            Some(origin) => ValidationOutcome::Approved {
                echoed_origin: origin.clone(),
                allowed_rate: self.allowed_rate_for(request),
            },
            None => ValidationOutcome::Rejected {
                reason: MISSING_ORIGIN_REASON.to_string(),
            },
        };

        Some(outcome)
    }

    fn allowed_rate_for(&self, request: &InboundRequest) -> Option<String> {
        request.first_header(REQUEST_RATE_HEADER)?;
        self.allowed_rate.clone()
    }
}
