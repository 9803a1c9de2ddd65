//! # Hookbridge Memory Adapter
//!
//! In-memory implementations of the hookbridge collaborator traits,
//! primarily intended for testing and development:
//! - `MemoryConfigStore`: configuration storage
//! - `MemoryHookProvider`: a simulated provider that enforces one hook per
//!   callback URL and records every call
//! - `RecordingChatClient`: a chat transport that records joins and messages
//! - `StaticCredentials`: fixed realm/user to client mapping
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hookbridge_adapter_memory::{MemoryHookProvider, StaticCredentials};
//!
//! let provider = Arc::new(MemoryHookProvider::new());
//! let credentials = StaticCredentials::new().with_client("github", "@bot:example.org", provider.clone());
//! ```

use async_trait::async_trait;
use hookbridge_core::{
    BridgeConfig, BridgeError, BridgeResult, ChatClient, ConfigStore, CredentialResolver,
    HookProvider, HookSpec, Notification, RemoteHook, GITHUB_REALM_TYPE,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Detail the simulated provider reports for a duplicate hook.
pub const HOOK_EXISTS_MESSAGE: &str = "Hook already exists on this repository";

// ==================== Configuration Store ====================

/// In-memory configuration store.
///
/// Data is lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    configs: Arc<RwLock<HashMap<String, BridgeConfig>>>,
}

impl MemoryConfigStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored configurations.
    pub async fn len(&self) -> usize {
        self.configs.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.configs.read().await.is_empty()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, id: &str) -> BridgeResult<Option<BridgeConfig>> {
        let configs = self.configs.read().await;
        Ok(configs.get(id).cloned())
    }

    async fn put(&self, config: &BridgeConfig) -> BridgeResult<()> {
        let mut configs = self.configs.write().await;
        configs.insert(config.id.clone(), config.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> BridgeResult<()> {
        let mut configs = self.configs.write().await;
        configs.remove(id);
        Ok(())
    }
}

// ==================== Simulated Provider ====================

/// A call made against the simulated provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    List { repo: String },
    Create { repo: String },
    Delete { repo: String, hook_id: u64 },
}

impl ProviderCall {
    /// Returns the `owner/repo` the call targeted.
    pub fn repo(&self) -> &str {
        match self {
            Self::List { repo } | Self::Create { repo } | Self::Delete { repo, .. } => repo,
        }
    }
}

/// Simulated provider hook registry.
///
/// Like the real provider it refuses a second hook with the same callback
/// URL on one repository with a 422, and treats repository names
/// case-insensitively.
#[derive(Debug, Default)]
pub struct MemoryHookProvider {
    hooks: RwLock<HashMap<String, Vec<RemoteHook>>>,
    calls: RwLock<Vec<ProviderCall>>,
    failing_repos: RwLock<HashSet<String>>,
    next_id: AtomicU64,
}

impl MemoryHookProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    /// Makes every call for `repo` fail with a 500.
    pub async fn fail_repo(&self, repo: impl Into<String>) {
        let repo: String = repo.into();
        self.failing_repos.write().await.insert(repo_key(&repo));
    }

    /// Installs a hook directly, bypassing duplicate checks.
    pub async fn insert_hook(&self, repo: impl Into<String>, config: Map<String, Value>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let hook = RemoteHook {
            id,
            name: "web".to_string(),
            active: true,
            events: Vec::new(),
            config,
        };
        let repo: String = repo.into();
        self.hooks.write().await.entry(repo_key(&repo)).or_default().push(hook);
        id
    }

    /// Removes every hook on a repository, as if deleted out-of-band.
    pub async fn clear_repo(&self, repo: &str) {
        self.hooks.write().await.remove(&repo_key(repo));
    }

    /// Returns the hooks currently installed on a repository.
    pub async fn hooks(&self, repo: &str) -> Vec<RemoteHook> {
        self.hooks.read().await.get(&repo_key(repo)).cloned().unwrap_or_default()
    }

    /// Returns every call made so far.
    pub async fn calls(&self) -> Vec<ProviderCall> {
        self.calls.read().await.clone()
    }

    /// Returns the delete calls made so far.
    pub async fn deletes(&self) -> Vec<ProviderCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, ProviderCall::Delete { .. }))
            .cloned()
            .collect()
    }

    async fn record(&self, call: ProviderCall) -> BridgeResult<()> {
        let repo = call.repo().to_string();
        self.calls.write().await.push(call);
        if self.failing_repos.read().await.contains(&repo_key(&repo)) {
            return Err(BridgeError::provider(500, format!("Simulated failure for {repo}")));
        }
        Ok(())
    }
}

#[async_trait]
impl HookProvider for MemoryHookProvider {
    async fn list_hooks(&self, owner: &str, repo: &str) -> BridgeResult<Vec<RemoteHook>> {
        let full_name = format!("{owner}/{repo}");
        self.record(ProviderCall::List { repo: full_name.clone() }).await?;
        Ok(self.hooks(&full_name).await)
    }

    async fn create_hook(&self, owner: &str, repo: &str, spec: &HookSpec) -> BridgeResult<RemoteHook> {
        let full_name = format!("{owner}/{repo}");
        self.record(ProviderCall::Create { repo: full_name.clone() }).await?;

        let mut hooks = self.hooks.write().await;
        let installed = hooks.entry(repo_key(&full_name)).or_default();
        if installed.iter().any(|h| h.callback_url() == spec.url()) {
            return Err(BridgeError::Provider {
                status: 422,
                message: "Validation Failed".to_string(),
                details: vec![HOOK_EXISTS_MESSAGE.to_string()],
            });
        }

        let hook = RemoteHook {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: spec.name.clone(),
            active: spec.active,
            events: spec.events.clone(),
            config: spec
                .config
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        };
        installed.push(hook.clone());
        Ok(hook)
    }

    async fn delete_hook(&self, owner: &str, repo: &str, hook_id: u64) -> BridgeResult<()> {
        let full_name = format!("{owner}/{repo}");
        self.record(ProviderCall::Delete {
            repo: full_name.clone(),
            hook_id,
        })
        .await?;

        let mut hooks = self.hooks.write().await;
        let installed = hooks.entry(repo_key(&full_name)).or_default();
        let before = installed.len();
        installed.retain(|h| h.id != hook_id);
        if installed.len() == before {
            return Err(BridgeError::provider(404, "Not Found"));
        }
        Ok(())
    }
}

fn repo_key(repo: &str) -> String {
    repo.to_ascii_lowercase()
}

// ==================== Chat Client ====================

/// Chat transport that records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingChatClient {
    joined: RwLock<Vec<String>>,
    sent: RwLock<Vec<(String, Notification)>>,
    failing_rooms: RwLock<HashSet<String>>,
}

impl RecordingChatClient {
    /// Creates a new client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes joins and sends for `room_id` fail.
    pub async fn fail_room(&self, room_id: impl Into<String>) {
        self.failing_rooms.write().await.insert(room_id.into());
    }

    /// Returns the rooms joined, in order.
    pub async fn joined(&self) -> Vec<String> {
        self.joined.read().await.clone()
    }

    /// Returns every message sent, in order.
    pub async fn sent(&self) -> Vec<(String, Notification)> {
        self.sent.read().await.clone()
    }

    /// Returns the rooms that received a message.
    pub async fn sent_rooms(&self) -> Vec<String> {
        self.sent.read().await.iter().map(|(room, _)| room.clone()).collect()
    }

    async fn check(&self, room_id: &str) -> BridgeResult<()> {
        if self.failing_rooms.read().await.contains(room_id) {
            return Err(BridgeError::chat(room_id, "Simulated failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatClient for RecordingChatClient {
    async fn join_room(&self, room_id: &str) -> BridgeResult<()> {
        self.check(room_id).await?;
        self.joined.write().await.push(room_id.to_string());
        Ok(())
    }

    async fn send_message(&self, room_id: &str, notification: &Notification) -> BridgeResult<()> {
        self.check(room_id).await?;
        self.sent
            .write()
            .await
            .push((room_id.to_string(), notification.clone()));
        Ok(())
    }
}

// ==================== Credentials ====================

/// Fixed mapping from realm and user to provider client.
///
/// Realms registered through `with_client` are GitHub realms.
#[derive(Default, Clone)]
pub struct StaticCredentials {
    realms: HashMap<String, String>,
    clients: HashMap<(String, String), Arc<dyn HookProvider>>,
}

impl StaticCredentials {
    /// Creates an empty mapping; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a realm of the given type without any sessions.
    pub fn with_realm(mut self, realm_id: impl Into<String>, realm_type: impl Into<String>) -> Self {
        self.realms.insert(realm_id.into(), realm_type.into());
        self
    }

    /// Registers a client for a user in a GitHub realm.
    pub fn with_client(
        mut self,
        realm_id: impl Into<String>,
        user_id: impl Into<String>,
        client: Arc<dyn HookProvider>,
    ) -> Self {
        let realm_id = realm_id.into();
        self.realms
            .entry(realm_id.clone())
            .or_insert_with(|| GITHUB_REALM_TYPE.to_string());
        self.clients.insert((realm_id, user_id.into()), client);
        self
    }
}

#[async_trait]
impl CredentialResolver for StaticCredentials {
    async fn realm_type(&self, realm_id: &str) -> Option<String> {
        self.realms.get(realm_id).cloned()
    }

    async fn resolve_client(&self, realm_id: &str, user_id: &str) -> Option<Arc<dyn HookProvider>> {
        self.clients
            .get(&(realm_id.to_string(), user_id.to_string()))
            .cloned()
    }
}
