//! Receiver for verifying and parsing inbound provider deliveries.

use std::collections::HashMap;

use hookbridge_core::{BridgeError, BridgeResult, Notification};

use crate::payload::EventPayload;
use crate::render::render_notification;
use crate::signature::{PayloadSigner, SignatureError};

/// Header carrying the event type.
pub const EVENT_HEADER: &str = "x-github-event";
/// Header carrying the HMAC-SHA256 signature of the body.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
/// Header carrying the provider's delivery ID.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Raw inbound HTTP request.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// HTTP headers (lowercase keys).
    pub headers: HashMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl InboundRequest {
    /// Creates a request with the given body and no headers.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }

    /// Gets a header value.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(&key.to_lowercase()).map(String::as_str)
    }
}

/// A verified, parsed delivery.
#[derive(Debug, Clone)]
pub struct InboundDelivery {
    /// Event type, e.g. `push`.
    pub event_type: String,
    /// Repository full name as reported by the provider.
    pub repo_full_name: String,
    /// Notice to post into subscribed rooms.
    pub notification: Notification,
    /// Provider delivery ID, for logs.
    pub delivery_id: Option<String>,
}

/// A request that passed verification.
#[derive(Debug, Clone)]
pub enum VerifiedRequest {
    /// Liveness check sent when a hook is created; answered without routing.
    Ping,
    /// An event to route.
    Event(InboundDelivery),
}

/// Trait for verifying and decoding inbound deliveries.
///
/// Failures are returned as `BridgeError::Verification` carrying the HTTP
/// status the endpoint must answer with.
pub trait DeliveryVerifier: Send + Sync {
    /// Verifies the request against `secret` (when set) and parses it.
    fn verify(&self, request: &InboundRequest, secret: Option<&str>) -> BridgeResult<VerifiedRequest>;
}

/// Verifier for GitHub-style deliveries.
#[derive(Debug, Clone, Default)]
pub struct GithubDeliveryVerifier;

impl GithubDeliveryVerifier {
    /// Creates a new verifier.
    pub fn new() -> Self {
        Self
    }
}

impl DeliveryVerifier for GithubDeliveryVerifier {
    fn verify(&self, request: &InboundRequest, secret: Option<&str>) -> BridgeResult<VerifiedRequest> {
        let event_type = request
            .header(EVENT_HEADER)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| BridgeError::verification(400, "Missing event type header"))?;

        if let Some(secret) = secret {
            let signature = request
                .header(SIGNATURE_HEADER)
                .ok_or_else(|| BridgeError::verification(400, "Missing signature header"))?;

            PayloadSigner::new(secret)
                .verify_header(signature, &request.body)
                .map_err(|e| match e {
                    SignatureError::InvalidFormat => BridgeError::verification(400, e.to_string()),
                    SignatureError::Invalid => BridgeError::verification(403, e.to_string()),
                })?;
        }

        if event_type == "ping" {
            return Ok(VerifiedRequest::Ping);
        }

        let payload: EventPayload = serde_json::from_slice(&request.body)
            .map_err(|e| BridgeError::verification(400, format!("Failed to parse event: {e}")))?;

        let repo_full_name = payload
            .repo_full_name()
            .ok_or_else(|| BridgeError::verification(400, "Event has no repository"))?
            .to_string();

        Ok(VerifiedRequest::Event(InboundDelivery {
            event_type: event_type.to_string(),
            notification: render_notification(event_type, &payload),
            repo_full_name,
            delivery_id: request.header(DELIVERY_HEADER).map(str::to_string),
        }))
    }
}
