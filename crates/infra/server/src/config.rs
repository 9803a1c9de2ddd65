//! Server configuration.

use serde::{Deserialize, Serialize};

/// Listener and logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Externally reachable base URL; callback URLs are built from it.
    pub public_url: String,
    /// Log level.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 9000,
            host: "0.0.0.0".to_string(),
            public_url: "http://localhost:9000".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Returns the callback URL for a service.
    pub fn callback_url(&self, service_id: &str) -> String {
        format!("{}/services/hooks/{}", self.public_url.trim_end_matches('/'), service_id)
    }
}

/// Chat homeserver connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Homeserver base URL.
    pub homeserver_url: String,
    /// The bot's user ID.
    pub user_id: String,
    /// Access token for the bot account.
    pub access_token: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Provider API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// API root.
    pub api_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// A provider token stored for one realm and user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub realm_id: String,
    /// Type of the realm; only `github` realms can register hooks.
    #[serde(default = "default_realm_type")]
    pub realm_type: String,
    pub user_id: String,
    pub token: String,
}

fn default_realm_type() -> String {
    hookbridge_core::GITHUB_REALM_TYPE.to_string()
}

/// Complete configuration file.
#[derive(Debug, Clone)]
pub struct HookbridgeConfig {
    pub server: ServerConfig,
    pub matrix: MatrixConfig,
    pub github: GithubConfig,
    pub credentials: Vec<CredentialConfig>,
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &str) -> Result<HookbridgeConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    parse_config(&content)
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<HookbridgeConfig, ConfigError> {
    let config: toml::Value =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let server: ServerConfig = section(&config, "server")?.unwrap_or_default();
    let github: GithubConfig = section(&config, "github")?.unwrap_or_default();
    let matrix: MatrixConfig =
        section(&config, "matrix")?.ok_or_else(|| ConfigError::MissingSection("matrix".to_string()))?;

    let mut credentials = Vec::new();
    if let Some(entries) = config.get("credentials").and_then(|v| v.as_array()) {
        for value in entries {
            let credential: CredentialConfig = toml::Value::try_into(value.clone())
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            credentials.push(credential);
        }
    }

    Ok(HookbridgeConfig {
        server,
        matrix,
        github,
        credentials,
    })
}

fn section<T: serde::de::DeserializeOwned>(config: &toml::Value, name: &str) -> Result<Option<T>, ConfigError> {
    config
        .get(name)
        .map(|v| toml::Value::try_into(v.clone()))
        .transpose()
        .map_err(|e| ConfigError::ParseError(format!("[{name}]: {e}")))
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Missing section: [{0}]")]
    MissingSection(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [server]
        port = 8080
        public_url = "https://bridge.example.org/"

        [matrix]
        homeserver_url = "https://matrix.example.org"
        user_id = "@hookbot:example.org"
        access_token = "syt_secret"

        [github]
        api_url = "https://git.example.org/api/v3"

        [[credentials]]
        realm_id = "github"
        user_id = "@alice:example.org"
        token = "ghp_alice"

        [[credentials]]
        realm_id = "github"
        user_id = "@bob:example.org"
        token = "ghp_bob"

        [[credentials]]
        realm_id = "jira"
        realm_type = "jira"
        user_id = "@bob:example.org"
        token = "jira_bob"
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(FULL).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.matrix.user_id, "@hookbot:example.org");
        assert_eq!(config.matrix.timeout_ms, 30_000);
        assert_eq!(config.github.api_url, "https://git.example.org/api/v3");
        assert_eq!(config.github.timeout_ms, 30_000);
        assert_eq!(config.credentials.len(), 3);
        assert_eq!(config.credentials[1].token, "ghp_bob");
        assert_eq!(config.credentials[1].realm_type, "github");
        assert_eq!(config.credentials[2].realm_type, "jira");
    }

    #[test]
    fn test_callback_url_trims_trailing_slash() {
        let config = parse_config(FULL).unwrap();
        assert_eq!(
            config.server.callback_url("svc-1"),
            "https://bridge.example.org/services/hooks/svc-1"
        );
    }

    #[test]
    fn test_matrix_section_required() {
        let err = parse_config("[server]\nport = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection(ref s) if s == "matrix"));
    }

    #[test]
    fn test_invalid_section_is_parse_error() {
        let err = parse_config("[matrix]\nhomeserver_url = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
