//! Pure functions over room bindings.
//!
//! These derive the remote hook state a configuration implies (`repos`),
//! the delta between two configurations (`diff`) and the rooms an inbound
//! event is routed to (`bindings_matching`).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, BridgeResult};
use crate::types::{BridgeConfig, RepoBinding};

/// A repository identifier split into owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoName {
    pub owner: String,
    pub name: String,
}

impl RepoName {
    /// Parses an `owner/repo` string.
    ///
    /// The value must contain exactly one `/` with a non-empty segment on
    /// each side.
    pub fn parse(full_name: &str) -> BridgeResult<Self> {
        let mut segments = full_name.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(BridgeError::malformed_repo(full_name)),
        }
    }

    /// Returns the `owner/repo` form.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoName {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Returns the distinct repositories referenced by any room.
///
/// Names are ASCII-lowercased: the provider treats `Acme/Widgets` and
/// `acme/widgets` as one repository, so both keys share one hook. Malformed
/// keys are logged and skipped. An absent configuration has no repositories.
pub fn repos(config: Option<&BridgeConfig>) -> BTreeSet<String> {
    let mut repos = BTreeSet::new();
    let Some(config) = config else {
        return repos;
    };

    for (room_id, room) in &config.rooms {
        for owner_repo in room.repos.keys() {
            if RepoName::parse(owner_repo).is_err() {
                tracing::error!(
                    repo = %owner_repo,
                    room_id = %room_id,
                    service_id = %config.id,
                    "Bad owner/repo key in config"
                );
                continue;
            }
            repos.insert(owner_repo.to_ascii_lowercase());
        }
    }

    repos
}

/// Repositories gained and lost between two configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoDiff {
    /// In the new set but not the old one.
    pub added: Vec<String>,
    /// In the old set but not the new one.
    pub removed: Vec<String>,
}

impl RepoDiff {
    /// Returns true if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Computes the set difference between new and old repositories in both directions.
pub fn diff(new_repos: &BTreeSet<String>, old_repos: &BTreeSet<String>) -> RepoDiff {
    RepoDiff {
        added: new_repos.difference(old_repos).cloned().collect(),
        removed: old_repos.difference(new_repos).cloned().collect(),
    }
}

/// A room bound to the repository an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding<'a> {
    pub room_id: &'a str,
    pub repo: &'a RepoBinding,
}

/// Returns every room binding whose repository key matches `repo_full_name`.
///
/// The provider and the configuration may disagree on casing, so the
/// comparison ignores ASCII case.
pub fn bindings_matching<'a>(config: &'a BridgeConfig, repo_full_name: &str) -> Vec<Binding<'a>> {
    config
        .rooms
        .iter()
        .flat_map(|(room_id, room)| {
            room.repos
                .iter()
                .filter(|(owner_repo, _)| owner_repo.eq_ignore_ascii_case(repo_full_name))
                .map(move |(_, repo)| Binding {
                    room_id: room_id.as_str(),
                    repo,
                })
        })
        .collect()
}
