//! Client-server API transport for room joins and notices.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};

use hookbridge_core::{BridgeError, BridgeResult, ChatClient, Notification};

use crate::config::MatrixConfig;

/// Chat client acting as the bridge's bot account.
#[derive(Debug, Clone)]
pub struct MatrixClient {
    http: reqwest::Client,
    homeserver_url: String,
    user_id: String,
    access_token: String,
    timeout: Duration,
}

impl MatrixClient {
    /// Creates a client from configuration.
    pub fn new(config: &MatrixConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            homeserver_url: config.homeserver_url.clone(),
            user_id: config.user_id.clone(),
            access_token: config.access_token.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Returns the bot account this client acts as.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> BridgeResult<Url> {
        let mut url = Url::parse(&self.homeserver_url)
            .map_err(|e| BridgeError::config(format!("Invalid homeserver URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| BridgeError::config("Homeserver URL cannot be a base"))?
            .pop_if_empty()
            .extend(["_matrix", "client", "v3"])
            .extend(segments);
        Ok(url)
    }

    fn join_url(&self, room_id: &str) -> BridgeResult<Url> {
        self.endpoint(["join", room_id])
    }

    fn send_url(&self, room_id: &str, txn_id: &str) -> BridgeResult<Url> {
        self.endpoint(["rooms", room_id, "send", "m.room.message", txn_id])
    }

    async fn send(&self, room_id: &str, request: RequestBuilder) -> BridgeResult<()> {
        let response = request
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| BridgeError::chat(room_id, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(user_id = %self.user_id, room_id, status = status.as_u16(), "Homeserver rejected request");
        Err(BridgeError::chat(room_id, format!("HTTP {}: {}", status.as_u16(), body)))
    }
}

#[async_trait]
impl ChatClient for MatrixClient {
    async fn join_room(&self, room_id: &str) -> BridgeResult<()> {
        let url = self.join_url(room_id)?;
        self.send(room_id, self.http.post(url).json(&serde_json::json!({}))).await
    }

    async fn send_message(&self, room_id: &str, notification: &Notification) -> BridgeResult<()> {
        let txn_id = uuid::Uuid::new_v4().to_string();
        let url = self.send_url(room_id, &txn_id)?;
        self.send(room_id, self.http.put(url).json(notification)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(homeserver_url: &str) -> MatrixClient {
        let config = MatrixConfig {
            homeserver_url: homeserver_url.to_string(),
            user_id: "@hookbot:example.org".to_string(),
            access_token: "token".to_string(),
            timeout_ms: 5_000,
        };
        MatrixClient::new(&config, reqwest::Client::new())
    }

    #[test]
    fn test_join_url_escapes_room_id() {
        let url = client("https://matrix.example.org").join_url("!abc:example.org").unwrap();
        assert_eq!(
            url.as_str(),
            "https://matrix.example.org/_matrix/client/v3/join/!abc:example.org"
        );

        let url = client("https://matrix.example.org/").join_url("#room/with slash").unwrap();
        assert_eq!(
            url.as_str(),
            "https://matrix.example.org/_matrix/client/v3/join/%23room%2Fwith%20slash"
        );
    }

    #[test]
    fn test_send_url() {
        let url = client("https://matrix.example.org")
            .send_url("!abc:example.org", "txn-1")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://matrix.example.org/_matrix/client/v3/rooms/!abc:example.org/send/m.room.message/txn-1"
        );
    }

    #[test]
    fn test_client_takes_identity_and_timeout_from_config() {
        let client = client("https://matrix.example.org");
        assert_eq!(client.user_id(), "@hookbot:example.org");
        assert_eq!(client.timeout, Duration::from_millis(5_000));
    }

    #[test]
    fn test_invalid_homeserver() {
        let err = client("not a url").join_url("!abc:example.org").unwrap_err();
        assert!(matches!(err, BridgeError::Config { .. }));
    }
}
