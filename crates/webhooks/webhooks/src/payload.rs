//! Provider event payloads.
//!
//! Only the fields the bridge routes on or renders are modelled; everything
//! else in a delivery is ignored.

use serde::{Deserialize, Serialize};

/// Common envelope of every repository event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPayload {
    /// Repository the event happened in.
    pub repository: Option<Repository>,
    pub sender: Option<Account>,
    pub action: Option<String>,

    /// `push`: full ref name, e.g. `refs/heads/main`.
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub commits: Vec<Commit>,
    /// `push`: comparison URL for the pushed range.
    pub compare: Option<String>,

    pub issue: Option<Issue>,
    pub pull_request: Option<Issue>,
    pub comment: Option<Comment>,
}

impl EventPayload {
    /// Returns the repository full name, if the payload carries one.
    pub fn repo_full_name(&self) -> Option<&str> {
        self.repository.as_ref().map(|r| r.full_name.as_str())
    }

    /// Returns the sender login, or a placeholder when absent.
    pub fn sender_login(&self) -> &str {
        self.sender.as_ref().map(|s| s.login.as_str()).unwrap_or("someone")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub message: String,
}

/// An issue or pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub body: String,
    pub html_url: Option<String>,
}
