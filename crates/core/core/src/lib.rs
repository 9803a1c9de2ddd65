//! # Hookbridge Core
//!
//! This crate provides the foundational types and traits for the hookbridge
//! system. It defines the declarative room bindings (`BridgeConfig`), the
//! pure binding model used to derive remote hook state from them, the error
//! taxonomy, and the trait interfaces that chat transports, provider clients
//! and storage adapters must implement.

pub mod binding;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at the crate root
pub use binding::{bindings_matching, diff, repos, Binding, RepoDiff, RepoName};
pub use error::{BridgeError, BridgeResult};
pub use traits::{ChatClient, ConfigStore, CredentialResolver, HookProvider};
pub use types::{
    BridgeConfig, HookSpec, Notification, RemoteHook, RepoBinding, RoomBinding, GITHUB_REALM_TYPE,
    HOOK_EVENTS,
};
