//! Idempotent create and delete of a single remote hook.
//!
//! Hooks are matched by callback URL rather than by provider-assigned ID:
//! the bridge never persists hook IDs, so a hook recreated out-of-band is
//! still found on the next delete.

use std::collections::HashMap;
use std::sync::Arc;

use hookbridge_core::{
    BridgeConfig, BridgeError, BridgeResult, CredentialResolver, HookProvider, HookSpec, RepoName,
    HOOK_EVENTS,
};

/// Outcome of a successful create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookCreation {
    /// The provider created a new hook.
    Created,
    /// A hook for this endpoint was already installed.
    AlreadyExists,
}

/// Creates and deletes the hook one bridge instance owns on a repository.
pub struct HookLifecycleManager {
    callback_url: String,
    secret_token: Option<String>,
    realm_id: String,
    user_id: String,
    credentials: Arc<dyn CredentialResolver>,
}

impl HookLifecycleManager {
    /// Creates a manager for the hooks of one configuration.
    pub fn for_config(config: &BridgeConfig, credentials: Arc<dyn CredentialResolver>) -> Self {
        Self {
            callback_url: config.callback_url.clone(),
            secret_token: config.secret().map(str::to_string),
            realm_id: config.realm_id.clone(),
            user_id: config.user_id.clone(),
            credentials,
        }
    }

    /// Returns the callback URL hooks are identified by.
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Builds the hook request: every routable event, JSON bodies, and the
    /// signing secret when one is configured.
    pub fn hook_spec(&self) -> HookSpec {
        let mut config = HashMap::from([
            ("content_type".to_string(), "json".to_string()),
            ("url".to_string(), self.callback_url.clone()),
        ]);
        if let Some(secret) = &self.secret_token {
            config.insert("secret".to_string(), secret.clone());
        }

        HookSpec {
            name: "web".to_string(),
            active: true,
            events: HOOK_EVENTS.iter().map(|e| e.to_string()).collect(),
            config,
        }
    }

    /// Creates the hook on `repo_full_name`.
    ///
    /// A provider rejection saying the hook already exists counts as success.
    pub async fn create(&self, client: &dyn HookProvider, repo_full_name: &str) -> BridgeResult<HookCreation> {
        let repo = RepoName::parse(repo_full_name)?;

        match client.create_hook(&repo.owner, &repo.name, &self.hook_spec()).await {
            Ok(hook) => {
                tracing::debug!(repo = %repo, hook_id = hook.id, "Created hook");
                Ok(HookCreation::Created)
            }
            Err(e) if e.is_hook_already_exists() => {
                tracing::info!(repo = %repo, "422 : Hook already exists");
                Ok(HookCreation::AlreadyExists)
            }
            Err(e) => Err(e),
        }
    }

    /// Deletes the hook on `owner/repo` whose callback URL is this bridge's.
    ///
    /// Returns the provider ID of the deleted hook.
    pub async fn delete(&self, owner: &str, repo: &str) -> BridgeResult<u64> {
        let full_name = format!("{owner}/{repo}");
        tracing::info!(repo = %full_name, endpoint = %self.callback_url, "Removing hook");

        let Some(client) = self
            .credentials
            .resolve_client(&self.realm_id, &self.user_id)
            .await
        else {
            tracing::warn!(
                repo = %full_name,
                user_id = %self.user_id,
                "Cannot delete webhook: no authenticated client exists for user ID"
            );
            return Err(BridgeError::no_session(&self.realm_id, &self.user_id));
        };

        let hooks = client.list_hooks(owner, repo).await?;
        let hook = hooks.into_iter().find(|h| match h.callback_url() {
            Some(url) => url == self.callback_url,
            None => {
                tracing::debug!(repo = %full_name, hook_id = h.id, "Ignoring hook without string config.url");
                false
            }
        });

        let Some(hook) = hook else {
            return Err(BridgeError::HookNotFound {
                repo: full_name,
                callback_url: self.callback_url.clone(),
            });
        };

        client.delete_hook(owner, repo, hook.id).await?;
        Ok(hook.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NoCredentials;

    #[async_trait]
    impl CredentialResolver for NoCredentials {
        async fn realm_type(&self, _realm_id: &str) -> Option<String> {
            None
        }

        async fn resolve_client(&self, _realm_id: &str, _user_id: &str) -> Option<Arc<dyn HookProvider>> {
            None
        }
    }

    fn manager(config: &BridgeConfig) -> HookLifecycleManager {
        HookLifecycleManager::for_config(config, Arc::new(NoCredentials))
    }

    #[test]
    fn test_hook_spec_without_secret() {
        let config = BridgeConfig::new("svc", "https://bridge.example.org/services/hooks/svc");
        let spec = manager(&config).hook_spec();

        assert_eq!(spec.name, "web");
        assert!(spec.active);
        assert_eq!(spec.events, HOOK_EVENTS.map(String::from).to_vec());
        assert_eq!(spec.url(), Some("https://bridge.example.org/services/hooks/svc"));
        assert_eq!(spec.config.get("content_type").map(String::as_str), Some("json"));
        assert!(!spec.config.contains_key("secret"));
    }

    #[test]
    fn test_hook_spec_with_secret() {
        let config = BridgeConfig::new("svc", "https://example.org/hook").with_secret("s3cret");
        let spec = manager(&config).hook_spec();
        assert_eq!(spec.config.get("secret").map(String::as_str), Some("s3cret"));
    }

    #[tokio::test]
    async fn test_delete_without_session() {
        let config = BridgeConfig::new("svc", "https://example.org/hook")
            .with_realm("github")
            .with_user("@alice:example.org");

        let err = manager(&config).delete("acme", "widgets").await.unwrap_err();
        assert!(matches!(err, BridgeError::NoSession { .. }));
    }
}
