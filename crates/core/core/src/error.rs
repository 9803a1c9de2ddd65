//! Error types for hookbridge.
//!
//! This module defines the `BridgeError` enum which represents every failure
//! the reconciliation engine, the hook lifecycle manager and the webhook
//! gateway can report, together with the collaborator failures they wrap.

use thiserror::Error;

/// Detail fragment the provider returns when a hook for the same endpoint exists.
const HOOK_EXISTS_DETAIL: &str = "already exists";

/// The main error type for hookbridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // ==================== Configuration Errors ====================
    /// The configuration is missing required fields or specifies nothing.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A repository identifier could not be split into `owner/repo`.
    #[error("Malformed repository identifier: {value}")]
    MalformedRepo { value: String },

    // ==================== Credential Errors ====================
    /// No provider session exists for the configured user in the realm.
    #[error("User {user_id} does not have a session with realm {realm_id}")]
    NoSession { realm_id: String, user_id: String },

    // ==================== Provider Errors ====================
    /// The provider rejected the request.
    #[error("Provider rejected request with status {status}: {message}")]
    Provider {
        status: u16,
        message: String,
        details: Vec<String>,
    },

    /// No remote hook on the repository points at this bridge's endpoint.
    #[error("Failed to find hook on {repo} with endpoint: {callback_url}")]
    HookNotFound { repo: String, callback_url: String },

    /// The request to a remote service did not complete.
    #[error("Transport error: {message}")]
    Transport { message: String },

    // ==================== Chat Errors ====================
    /// The chat transport failed to join a room or send a message.
    #[error("Chat error in room {room_id}: {message}")]
    Chat { room_id: String, message: String },

    // ==================== Inbound Errors ====================
    /// An inbound delivery failed verification or could not be parsed.
    #[error("Delivery rejected ({status}): {message}")]
    Verification { status: u16, message: String },

    // ==================== Internal Errors ====================
    /// A storage operation failed.
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl BridgeError {
    /// Creates a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a new malformed repository error.
    pub fn malformed_repo(value: impl Into<String>) -> Self {
        Self::MalformedRepo {
            value: value.into(),
        }
    }

    /// Creates a new missing session error.
    pub fn no_session(realm_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::NoSession {
            realm_id: realm_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Creates a new provider rejection without error details.
    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Creates a new chat error.
    pub fn chat(room_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Chat {
            room_id: room_id.into(),
            message: message.into(),
        }
    }

    /// Creates a new verification error carrying the response status.
    pub fn verification(status: u16, message: impl Into<String>) -> Self {
        Self::Verification {
            status,
            message: message.into(),
        }
    }

    /// Creates a new storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns true if the provider refused a create because the hook exists.
    ///
    /// Only a 422 whose error details mention an existing hook counts; any
    /// other validation failure is a real error.
    pub fn is_hook_already_exists(&self) -> bool {
        match self {
            Self::Provider {
                status: 422,
                details,
                ..
            } => details.iter().any(|d| d.contains(HOOK_EXISTS_DETAIL)),
            _ => false,
        }
    }

    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Config { .. } | Self::MalformedRepo { .. } => 400,
            Self::NoSession { .. } => 403,
            Self::HookNotFound { .. } => 404,
            Self::Verification { status, .. } => *status,
            Self::Provider { .. } | Self::Transport { .. } | Self::Chat { .. } => 502,
            Self::Storage { .. } | Self::Serialization { .. } => 500,
        }
    }
}

/// A Result type alias using BridgeError.
pub type BridgeResult<T> = Result<T, BridgeError>;

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}
