//! Two-phase reconciliation of remote hooks against a configuration change.
//!
//! Phase 1 (`register`) creates hooks for newly bound repositories and
//! joins rooms; any failure aborts the change. Phase 2 (`post_register`)
//! removes hooks for repositories no longer bound and prunes the stored
//! configuration once nothing is subscribed. Phase 2 never fails: removal is
//! eventually consistent and must not block a registration that already
//! took effect.
//!
//! Callers must serialize both phases per configuration ID.

use std::sync::Arc;

use hookbridge_core::{
    diff, repos, BridgeConfig, BridgeError, BridgeResult, ChatClient, ConfigStore,
    CredentialResolver, RepoName, GITHUB_REALM_TYPE,
};

use crate::lifecycle::{HookCreation, HookLifecycleManager};

/// What phase 1 changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterReport {
    /// Repositories that received a new hook.
    pub created: Vec<String>,
    /// Repositories whose hook already existed.
    pub already_existing: Vec<String>,
    /// Rooms joined.
    pub joined_rooms: Vec<String>,
    /// Repositories left for phase 2 to unhook.
    pub pending_removals: Vec<String>,
}

/// Outcome of removing one repository's hook in phase 2.
#[derive(Debug)]
pub struct HookRemoval {
    pub repo: String,
    pub result: BridgeResult<u64>,
}

/// What phase 2 did.
#[derive(Debug, Default)]
pub struct PostRegisterReport {
    pub removals: Vec<HookRemoval>,
    /// True if the configuration was deleted from storage.
    pub pruned: bool,
}

impl PostRegisterReport {
    /// Returns the repositories whose hook removal failed.
    pub fn failed_removals(&self) -> Vec<&str> {
        self.removals
            .iter()
            .filter(|r| r.result.is_err())
            .map(|r| r.repo.as_str())
            .collect()
    }
}

/// Drives hook lifecycle across configuration changes.
pub struct ReconciliationEngine {
    credentials: Arc<dyn CredentialResolver>,
    store: Arc<dyn ConfigStore>,
}

impl ReconciliationEngine {
    /// Creates a new engine.
    pub fn new(credentials: Arc<dyn CredentialResolver>, store: Arc<dyn ConfigStore>) -> Self {
        Self { credentials, store }
    }

    /// Phase 1: creates hooks for added repositories and joins every room.
    ///
    /// Hooks for removed repositories are left for `post_register`. Hooks
    /// created before a failure stay on the provider; creation is idempotent
    /// so a retried registration picks them up as already existing.
    pub async fn register(
        &self,
        new: &BridgeConfig,
        old: Option<&BridgeConfig>,
        chat: &dyn ChatClient,
    ) -> BridgeResult<RegisterReport> {
        if new.realm_id.is_empty() || new.user_id.is_empty() {
            return Err(BridgeError::config("realm_id and user_id are required"));
        }

        match self.credentials.realm_type(&new.realm_id).await {
            None => {
                return Err(BridgeError::config(format!("Unknown realm {}", new.realm_id)));
            }
            Some(realm_type) if realm_type != GITHUB_REALM_TYPE => {
                return Err(BridgeError::config(format!(
                    "Realm is of type '{realm_type}', not '{GITHUB_REALM_TYPE}'"
                )));
            }
            Some(_) => {}
        }

        let Some(client) = self
            .credentials
            .resolve_client(&new.realm_id, &new.user_id)
            .await
        else {
            return Err(BridgeError::no_session(&new.realm_id, &new.user_id));
        };

        let new_repos = repos(Some(new));
        let old_repos = repos(old);
        let delta = diff(&new_repos, &old_repos);

        // Nothing configured and nothing being removed is most likely a
        // mistake rather than an intentional teardown.
        if new_repos.is_empty() && delta.removed.is_empty() {
            return Err(BridgeError::config("No webhooks specified"));
        }

        let lifecycle = HookLifecycleManager::for_config(new, self.credentials.clone());
        let mut report = RegisterReport {
            pending_removals: delta.removed,
            ..Default::default()
        };

        for repo in delta.added {
            match lifecycle.create(client.as_ref(), &repo).await {
                Ok(HookCreation::Created) => {
                    tracing::info!(repo = %repo, service_id = %new.id, "Created webhook");
                    report.created.push(repo);
                }
                Ok(HookCreation::AlreadyExists) => report.already_existing.push(repo),
                Err(e) => {
                    tracing::error!(repo = %repo, service_id = %new.id, error = %e, "Failed to create webhook");
                    return Err(e);
                }
            }
        }

        for room_id in new.rooms.keys() {
            chat.join_room(room_id).await?;
            report.joined_rooms.push(room_id.clone());
        }

        tracing::info!(
            service_id = %new.id,
            created = report.created.len(),
            rooms = report.joined_rooms.len(),
            "Registered service"
        );
        Ok(report)
    }

    /// Phase 2: removes hooks for repositories dropped from the configuration
    /// and prunes the configuration once it subscribes to nothing.
    pub async fn post_register(&self, new: &BridgeConfig, old: Option<&BridgeConfig>) -> PostRegisterReport {
        let new_repos = repos(Some(new));
        let delta = diff(&new_repos, &repos(old));
        let lifecycle = HookLifecycleManager::for_config(new, self.credentials.clone());
        let mut report = PostRegisterReport::default();

        for repo in delta.removed {
            let result = match RepoName::parse(&repo) {
                Ok(name) => lifecycle.delete(&name.owner, &name.name).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                tracing::warn!(repo = %repo, service_id = %new.id, error = %e, "Failed to remove webhook");
            }
            report.removals.push(HookRemoval { repo, result });
        }

        if new_repos.is_empty() {
            tracing::info!(service_id = %new.id, "Removing service as no webhooks are registered");
            match self.store.delete(&new.id).await {
                Ok(()) => report.pruned = true,
                Err(e) => tracing::error!(service_id = %new.id, error = %e, "Failed to delete service"),
            }
        }

        report
    }
}
