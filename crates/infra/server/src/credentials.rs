//! Provider clients resolved from configured tokens.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use hookbridge_core::{CredentialResolver, HookProvider, GITHUB_REALM_TYPE};
use hookbridge_webhooks::GithubClient;

use crate::config::{CredentialConfig, GithubConfig};

/// Resolves a realm and user to a client built from their stored token.
#[derive(Debug, Default)]
pub struct TokenCredentials {
    realms: HashMap<String, String>,
    clients: HashMap<(String, String), Arc<GithubClient>>,
}

impl TokenCredentials {
    /// Builds one client per GitHub credential, sharing a connection pool.
    ///
    /// Credentials in other realm types only register their realm.
    pub fn from_config(credentials: &[CredentialConfig], github: &GithubConfig, http: reqwest::Client) -> Self {
        let mut realms: HashMap<String, String> = HashMap::new();
        for c in credentials {
            let realm_type = realms.entry(c.realm_id.clone()).or_insert_with(|| c.realm_type.clone());
            if *realm_type != c.realm_type {
                tracing::warn!(
                    realm_id = %c.realm_id,
                    realm_type = %realm_type,
                    ignored = %c.realm_type,
                    "Conflicting realm types; keeping the first"
                );
            }
        }

        let clients = credentials
            .iter()
            .filter(|c| realms.get(&c.realm_id).map(String::as_str) == Some(GITHUB_REALM_TYPE))
            .map(|c| {
                let client = GithubClient::new(&c.token)
                    .with_api_url(&github.api_url)
                    .with_timeout_ms(github.timeout_ms)
                    .with_http_client(http.clone());
                ((c.realm_id.clone(), c.user_id.clone()), Arc::new(client))
            })
            .collect();
        Self { realms, clients }
    }

    /// Returns the number of configured sessions.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl CredentialResolver for TokenCredentials {
    async fn realm_type(&self, realm_id: &str) -> Option<String> {
        self.realms.get(realm_id).cloned()
    }

    async fn resolve_client(&self, realm_id: &str, user_id: &str) -> Option<Arc<dyn HookProvider>> {
        let client: Arc<dyn HookProvider> = self
            .clients
            .get(&(realm_id.to_string(), user_id.to_string()))?
            .clone();
        Some(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_configured_sessions_only() {
        let credentials = TokenCredentials::from_config(
            &[
                CredentialConfig {
                    realm_id: "github".to_string(),
                    realm_type: "github".to_string(),
                    user_id: "@alice:example.org".to_string(),
                    token: "ghp_alice".to_string(),
                },
                CredentialConfig {
                    realm_id: "jira".to_string(),
                    realm_type: "jira".to_string(),
                    user_id: "@alice:example.org".to_string(),
                    token: "jira_alice".to_string(),
                },
            ],
            &GithubConfig::default(),
            reqwest::Client::new(),
        );

        assert_eq!(credentials.len(), 1);
        assert_eq!(credentials.realm_type("github").await.as_deref(), Some("github"));
        assert_eq!(credentials.realm_type("jira").await.as_deref(), Some("jira"));
        assert!(credentials.realm_type("gitlab").await.is_none());
        assert!(credentials.resolve_client("github", "@alice:example.org").await.is_some());
        assert!(credentials.resolve_client("github", "@bob:example.org").await.is_none());
        assert!(credentials.resolve_client("gitlab", "@alice:example.org").await.is_none());
        assert!(credentials.resolve_client("jira", "@alice:example.org").await.is_none());
    }
}
