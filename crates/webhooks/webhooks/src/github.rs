//! GitHub REST client for repository hooks.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, RequestBuilder, Response, Url};
use serde::Deserialize;

use hookbridge_core::{BridgeError, BridgeResult, HookProvider, HookSpec, RemoteHook};

/// Public GitHub API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("hookbridge/", env!("CARGO_PKG_VERSION"));

/// Largest page size the hooks listing accepts.
const PER_PAGE: &str = "100";

/// Error body returned by the API.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Hook API client acting with one user's token.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    timeout: Duration,
}

impl GithubClient {
    /// Creates a client for the public API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the API root, e.g. for GitHub Enterprise.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout = Duration::from_millis(timeout_ms);
        self
    }

    /// Shares an existing connection pool.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn hooks_url(&self, owner: &str, repo: &str, hook_id: Option<u64>) -> BridgeResult<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| BridgeError::config(format!("Invalid API URL {}: {e}", self.api_url)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| BridgeError::config(format!("API URL cannot be a base: {}", self.api_url)))?;
            segments.pop_if_empty().extend(["repos", owner, repo, "hooks"]);
            if let Some(id) = hook_id {
                segments.push(&id.to_string());
            }
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> BridgeResult<Response> {
        let response = request
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(BridgeError::Provider {
            status: status.as_u16(),
            message: body.message,
            details: body.errors.into_iter().map(|e| e.message).collect(),
        })
    }
}

#[async_trait]
impl HookProvider for GithubClient {
    async fn list_hooks(&self, owner: &str, repo: &str) -> BridgeResult<Vec<RemoteHook>> {
        let mut url = self.hooks_url(owner, repo, None)?;
        url.query_pairs_mut().append_pair("per_page", PER_PAGE);
        let origin = url.origin();

        let mut hooks = Vec::new();
        loop {
            let response = self.send(self.http.get(url)).await?;
            let next = response
                .headers()
                .get(header::LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link)
                .map(Url::parse)
                .transpose()
                .map_err(|e| BridgeError::Transport {
                    message: format!("Invalid Link header: {e}"),
                })?;

            let page: Vec<RemoteHook> = response.json().await.map_err(transport_error)?;
            hooks.extend(page);

            match next {
                // The token is only ever sent to the configured API host.
                Some(next) if next.origin() == origin => url = next,
                Some(next) => {
                    tracing::warn!(owner, repo, next = %next, "Ignoring pagination link to another host");
                    break;
                }
                None => break,
            }
        }
        Ok(hooks)
    }

    async fn create_hook(&self, owner: &str, repo: &str, spec: &HookSpec) -> BridgeResult<RemoteHook> {
        let url = self.hooks_url(owner, repo, None)?;
        let response = self.send(self.http.post(url).json(spec)).await?;
        response.json().await.map_err(transport_error)
    }

    async fn delete_hook(&self, owner: &str, repo: &str, hook_id: u64) -> BridgeResult<()> {
        let url = self.hooks_url(owner, repo, Some(hook_id))?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

/// Extracts the `rel="next"` target from a `Link` header.
fn next_link(link: &str) -> Option<&str> {
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if !params.split(';').any(|p| p.trim() == r#"rel="next""#) {
            return None;
        }
        target.trim().strip_prefix('<')?.strip_suffix('>')
    })
}

/// Converts a reqwest failure into a transport error.
fn transport_error(err: reqwest::Error) -> BridgeError {
    if err.is_timeout() {
        BridgeError::Transport {
            message: "Request timeout".to_string(),
        }
    } else {
        BridgeError::Transport {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hooks_url() {
        let client = GithubClient::new("token");
        assert_eq!(
            client.hooks_url("acme", "widgets", None).unwrap().as_str(),
            "https://api.github.com/repos/acme/widgets/hooks"
        );
        assert_eq!(
            client.hooks_url("acme", "widgets", Some(42)).unwrap().as_str(),
            "https://api.github.com/repos/acme/widgets/hooks/42"
        );
    }

    #[test]
    fn test_hooks_url_enterprise_base() {
        let client = GithubClient::new("token").with_api_url("https://git.example.org/api/v3/");
        assert_eq!(
            client.hooks_url("acme", "widgets", None).unwrap().as_str(),
            "https://git.example.org/api/v3/repos/acme/widgets/hooks"
        );
    }

    #[test]
    fn test_next_link() {
        let link = r#"<https://api.github.com/repositories/1/hooks?per_page=100&page=2>; rel="next", <https://api.github.com/repositories/1/hooks?per_page=100&page=5>; rel="last""#;
        assert_eq!(
            next_link(link),
            Some("https://api.github.com/repositories/1/hooks?per_page=100&page=2")
        );

        let last_page = r#"<https://api.github.com/repositories/1/hooks?page=1>; rel="first", <https://api.github.com/repositories/1/hooks?page=4>; rel="prev""#;
        assert_eq!(next_link(last_page), None);
        assert_eq!(next_link(""), None);
    }

    #[test]
    fn test_error_body_parsing() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"message":"Validation Failed","errors":[{"resource":"Hook","code":"custom","message":"Hook already exists on this repository"}]}"#,
        )
        .unwrap();
        assert_eq!(body.message, "Validation Failed");
        assert_eq!(body.errors[0].message, "Hook already exists on this repository");
    }
}
