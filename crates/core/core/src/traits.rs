//! Core traits for hookbridge.
//!
//! This module defines the collaborator interfaces the bridge core drives:
//! configuration storage, the chat transport, the webhook provider's REST
//! client and the credential lookup that hands out authenticated clients.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::BridgeResult;
use crate::types::{BridgeConfig, HookSpec, Notification, RemoteHook};

/// Trait for configuration storage backends.
///
/// Writes always replace the whole record. Readers get whatever the backend
/// considers the latest committed version.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Gets a configuration by ID.
    async fn get(&self, id: &str) -> BridgeResult<Option<BridgeConfig>>;

    /// Saves a configuration, replacing any previous version.
    async fn put(&self, config: &BridgeConfig) -> BridgeResult<()>;

    /// Deletes a configuration. Deleting a missing ID is not an error.
    async fn delete(&self, id: &str) -> BridgeResult<()>;
}

/// Trait for the chat transport the bridge posts into.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Joins a room as the bridge identity.
    async fn join_room(&self, room_id: &str) -> BridgeResult<()>;

    /// Sends a notification to a room.
    async fn send_message(&self, room_id: &str, notification: &Notification) -> BridgeResult<()>;
}

/// Trait for the webhook provider's hook API, bound to one credential.
#[async_trait]
pub trait HookProvider: Send + Sync {
    /// Lists the hooks installed on a repository.
    async fn list_hooks(&self, owner: &str, repo: &str) -> BridgeResult<Vec<RemoteHook>>;

    /// Creates a hook on a repository.
    async fn create_hook(&self, owner: &str, repo: &str, spec: &HookSpec) -> BridgeResult<RemoteHook>;

    /// Deletes a hook by its provider-assigned ID.
    async fn delete_hook(&self, owner: &str, repo: &str, hook_id: u64) -> BridgeResult<()>;
}

/// Trait for looking up authenticated provider clients.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Returns the type of a realm (e.g. `github`), or `None` if it is unknown.
    async fn realm_type(&self, realm_id: &str) -> Option<String>;

    /// Returns a client acting as `user_id` in `realm_id`, or `None` when the
    /// user has no usable session.
    async fn resolve_client(&self, realm_id: &str, user_id: &str) -> Option<Arc<dyn HookProvider>>;
}
