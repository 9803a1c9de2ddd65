//! # Hookbridge Server
//!
//! Standalone bridge process: accepts service configuration on an admin
//! route, keeps provider hooks in sync with it and relays deliveries into
//! chat rooms.

mod config;
mod credentials;
mod matrix;
mod routes;

pub use config::{
    load_config, parse_config, ConfigError, CredentialConfig, GithubConfig, HookbridgeConfig,
    MatrixConfig, ServerConfig,
};
pub use credentials::TokenCredentials;
pub use matrix::MatrixClient;
pub use routes::{routes, ApiError, AppState, ServiceRequest, ServiceResponse};

use std::sync::Arc;

use hookbridge_adapter_memory::MemoryConfigStore;
use hookbridge_core::{ChatClient, ConfigStore, CredentialResolver};
use hookbridge_webhooks::{GithubDeliveryVerifier, ServiceManager, WebhookGateway};

/// The bridge server.
pub struct HookbridgeServer {
    /// Server configuration.
    pub config: ServerConfig,
    state: AppState,
}

impl HookbridgeServer {
    /// Creates a server with explicit collaborators.
    pub fn new(
        config: ServerConfig,
        credentials: Arc<dyn CredentialResolver>,
        store: Arc<dyn ConfigStore>,
        chat: Arc<dyn ChatClient>,
    ) -> Self {
        let gateway = WebhookGateway::new(
            Arc::new(GithubDeliveryVerifier::new()),
            chat.clone(),
            credentials.clone(),
            store.clone(),
        );
        let manager = ServiceManager::new(credentials, store, chat);
        let state = AppState {
            gateway: Arc::new(gateway),
            manager: Arc::new(manager),
            server: Arc::new(config.clone()),
        };
        Self { config, state }
    }

    /// Creates a server from a loaded configuration file.
    ///
    /// Service configurations are held in memory and lost on restart.
    pub fn from_config(config: HookbridgeConfig) -> Self {
        let http = reqwest::Client::new();
        let credentials = TokenCredentials::from_config(&config.credentials, &config.github, http.clone());
        if credentials.is_empty() {
            tracing::warn!("No credentials configured; every service registration will fail");
        }
        let chat = MatrixClient::new(&config.matrix, http);
        tracing::info!(user_id = %chat.user_id(), homeserver = %config.matrix.homeserver_url, "Chat client ready");

        Self::new(
            config.server,
            Arc::new(credentials),
            Arc::new(MemoryConfigStore::new()),
            Arc::new(chat),
        )
    }

    /// Returns the router serving every route.
    pub fn router(&self) -> axum::Router {
        routes(self.state.clone())
    }

    /// Starts the server.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!(addr = %addr, public_url = %self.config.public_url, "Starting Hookbridge Server");
        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use hookbridge_adapter_memory::{MemoryHookProvider, RecordingChatClient, StaticCredentials};
    use tower::ServiceExt;

    struct Harness {
        server: HookbridgeServer,
        provider: Arc<MemoryHookProvider>,
        chat: Arc<RecordingChatClient>,
        store: Arc<MemoryConfigStore>,
    }

    fn harness() -> Harness {
        let provider = Arc::new(MemoryHookProvider::new());
        let chat = Arc::new(RecordingChatClient::new());
        let store = Arc::new(MemoryConfigStore::new());
        let credentials = StaticCredentials::new().with_client("github", "@alice:example.org", provider.clone());
        let config = ServerConfig {
            public_url: "https://bridge.example.org".to_string(),
            ..Default::default()
        };
        let server = HookbridgeServer::new(config, Arc::new(credentials), store.clone(), chat.clone());
        Harness {
            server,
            provider,
            chat,
            store,
        }
    }

    fn configure_request(body: serde_json::Value) -> Request<Body> {
        Request::post("/admin/configureService")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn hook_request(id: &str, event: &str, repo: &str) -> Request<Body> {
        let body = serde_json::json!({
            "ref": "refs/heads/main",
            "repository": { "full_name": repo },
            "sender": { "login": "bob" },
            "commits": [{ "id": "abc1234", "message": "Fix" }]
        });
        Request::post(format!("/services/hooks/{id}"))
            .header("x-github-event", event)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn service() -> serde_json::Value {
        serde_json::json!({
            "id": "svc",
            "realm_id": "github",
            "user_id": "@alice:example.org",
            "rooms": {
                "!r1:example.org": { "repos": { "acme/widgets": { "events": ["push"] } } }
            }
        })
    }

    #[tokio::test]
    async fn test_configure_then_deliver() {
        let h = harness();

        let response = h.server.router().oneshot(configure_request(service())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ServiceResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.old.is_none());
        assert_eq!(body.new.callback_url, "https://bridge.example.org/services/hooks/svc");
        assert_eq!(body.created, vec!["acme/widgets".to_string()]);

        let hooks = h.provider.hooks("acme/widgets").await;
        assert_eq!(hooks[0].callback_url(), Some(body.new.callback_url.as_str()));
        assert!(h.store.get("svc").await.unwrap().is_some());

        let response = h
            .server
            .router()
            .oneshot(hook_request("svc", "push", "acme/widgets"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.chat.sent_rooms().await, vec!["!r1:example.org".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_service_is_not_found() {
        let h = harness();
        let response = h
            .server
            .router()
            .oneshot(hook_request("nope", "push", "acme/widgets"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_configure_errors_map_to_status() {
        let h = harness();

        let mut missing_user = service();
        missing_user["user_id"] = serde_json::json!("");
        let response = h.server.router().oneshot(configure_request(missing_user)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut no_session = service();
        no_session["user_id"] = serde_json::json!("@mallory:example.org");
        let response = h.server.router().oneshot(configure_request(no_session)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        h.provider.fail_repo("acme/widgets").await;
        let response = h.server.router().oneshot(configure_request(service())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(h.store.is_empty().await);
    }
}
