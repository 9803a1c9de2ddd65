//! Core data types for hookbridge.
//!
//! This module defines the declarative `BridgeConfig` that one bridge
//! instance reconciles against the provider, and the wire types exchanged
//! with the provider (`HookSpec`, `RemoteHook`) and the chat transport
//! (`Notification`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

/// Every event type a remote hook is subscribed to.
///
/// Hooks are never narrowed per room; routing filters on each
/// `RepoBinding` instead.
pub const HOOK_EVENTS: [&str; 5] = [
    "push",
    "pull_request",
    "issues",
    "issue_comment",
    "pull_request_review_comment",
];

/// Realm type whose credentials drive the hook API.
pub const GITHUB_REALM_TYPE: &str = "github";

/// Declarative state of one bridge instance.
///
/// Each reconciliation supplies the full new state; configurations are
/// replaced whole, never merged.
///
/// # Example
///
/// ```rust
/// use hookbridge_core::BridgeConfig;
///
/// let config = BridgeConfig::new("svc-1", "https://bridge.example.org/services/hooks/svc-1")
///     .with_realm("github")
///     .with_user("@alice:example.org")
///     .bind("!room:example.org", "acme/widgets", ["push"]);
/// assert_eq!(config.rooms.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Opaque stable identifier.
    pub id: String,

    /// The bridge's own public endpoint; identifies remote hooks.
    pub callback_url: String,

    /// Auth realm holding the provider credential.
    #[serde(default)]
    pub realm_id: String,

    /// User whose provider credential is used for API calls.
    #[serde(default)]
    pub user_id: String,

    /// Shared secret for inbound signatures; empty disables verification.
    #[serde(default)]
    pub secret_token: String,

    /// Room bindings keyed by room identifier.
    #[serde(default)]
    pub rooms: HashMap<String, RoomBinding>,
}

impl BridgeConfig {
    /// Creates an empty configuration for the given id and callback URL.
    pub fn new(id: impl Into<String>, callback_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            callback_url: callback_url.into(),
            realm_id: String::new(),
            user_id: String::new(),
            secret_token: String::new(),
            rooms: HashMap::new(),
        }
    }

    /// Sets the auth realm.
    pub fn with_realm(mut self, realm_id: impl Into<String>) -> Self {
        self.realm_id = realm_id.into();
        self
    }

    /// Sets the acting user.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Sets the shared secret.
    pub fn with_secret(mut self, secret_token: impl Into<String>) -> Self {
        self.secret_token = secret_token.into();
        self
    }

    /// Binds a room to a repository for the given event types.
    ///
    /// Binding the same room and repository again replaces its event set.
    pub fn bind(
        mut self,
        room_id: impl Into<String>,
        repo: impl Into<String>,
        events: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.rooms
            .entry(room_id.into())
            .or_default()
            .repos
            .insert(repo.into(), RepoBinding::new(events));
        self
    }

    /// Adds a room with no repository bindings.
    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.rooms.entry(room_id.into()).or_default();
        self
    }

    /// Returns the secret token, or `None` when verification is disabled.
    pub fn secret(&self) -> Option<&str> {
        if self.secret_token.is_empty() {
            None
        } else {
            Some(&self.secret_token)
        }
    }
}

/// Repositories bound to a single room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomBinding {
    /// Bindings keyed by `owner/repo`.
    #[serde(default)]
    pub repos: HashMap<String, RepoBinding>,
}

/// Event types a room wants for one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoBinding {
    #[serde(default)]
    pub events: BTreeSet<String>,
}

impl RepoBinding {
    /// Creates a binding for the given event types.
    pub fn new(events: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            events: events.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if the room should be notified for this event type.
    pub fn wants(&self, event_type: &str) -> bool {
        self.events.contains(event_type)
    }
}

/// Request body for creating a remote hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSpec {
    /// Hook type; the provider only accepts `web` for URL hooks.
    pub name: String,
    pub active: bool,
    pub events: Vec<String>,
    /// Delivery settings (`url`, `content_type`, optional `secret`).
    pub config: HashMap<String, String>,
}

impl HookSpec {
    /// Returns the callback URL this spec registers.
    pub fn url(&self) -> Option<&str> {
        self.config.get("url").map(String::as_str)
    }
}

/// A hook as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteHook {
    /// Provider-assigned identifier.
    pub id: u64,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub events: Vec<String>,

    /// Raw delivery settings; `url` may be absent or not a string.
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl RemoteHook {
    /// Returns the configured callback URL if it is present and a string.
    pub fn callback_url(&self) -> Option<&str> {
        self.config.get("url").and_then(Value::as_str)
    }
}

/// A message sent to a chat room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub msgtype: String,
    pub body: String,
}

impl Notification {
    /// Creates a notice, the message type bots use for automated output.
    pub fn notice(body: impl Into<String>) -> Self {
        Self {
            msgtype: "m.notice".to_string(),
            body: body.into(),
        }
    }
}
