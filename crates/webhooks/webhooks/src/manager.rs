//! Service manager - hosts registration calls.
//!
//! The manager owns the critical section reconciliation relies on: phase 1,
//! the store write and phase 2 for one configuration ID never interleave
//! with another change to the same ID. Different IDs proceed in parallel.
//! A lock entry lives only while some call for its ID is running or waiting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};

use hookbridge_core::{BridgeConfig, BridgeResult, ChatClient, ConfigStore, CredentialResolver};

use crate::reconcile::{PostRegisterReport, ReconciliationEngine, RegisterReport};

/// Result of applying one configuration change.
#[derive(Debug)]
pub struct ConfigureOutcome {
    /// The configuration that was replaced, if any.
    pub old: Option<BridgeConfig>,
    /// The configuration now in effect.
    pub new: BridgeConfig,
    pub register: RegisterReport,
    pub post_register: PostRegisterReport,
}

/// Applies configuration changes through the reconciliation engine.
pub struct ServiceManager {
    engine: ReconciliationEngine,
    store: Arc<dyn ConfigStore>,
    chat: Arc<dyn ChatClient>,
    locks: LockMap,
}

type LockMap = StdMutex<HashMap<String, Arc<Mutex<()>>>>;

impl ServiceManager {
    /// Creates a new service manager.
    pub fn new(
        credentials: Arc<dyn CredentialResolver>,
        store: Arc<dyn ConfigStore>,
        chat: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            engine: ReconciliationEngine::new(credentials, store.clone()),
            store,
            chat,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Gets the reconciliation engine.
    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// Replaces the stored configuration with `new`.
    ///
    /// Runs phase 1 against the stored version, persists `new`, then runs
    /// phase 2. A phase-1 failure leaves the stored configuration untouched.
    pub async fn configure(&self, new: BridgeConfig) -> BridgeResult<ConfigureOutcome> {
        let _lease = self.lock(&new.id).await;

        let old = self.store.get(&new.id).await?;
        let register = self.engine.register(&new, old.as_ref(), self.chat.as_ref()).await?;
        self.store.put(&new).await?;
        let post_register = self.engine.post_register(&new, old.as_ref()).await;

        tracing::info!(
            service_id = %new.id,
            created = register.created.len(),
            removed = post_register.removals.len(),
            pruned = post_register.pruned,
            "Configured service"
        );

        Ok(ConfigureOutcome {
            old,
            new,
            register,
            post_register,
        })
    }

    async fn lock(&self, id: &str) -> IdLease<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.entry(id.to_string()).or_default().clone()
        };
        let mut lease = IdLease {
            locks: &self.locks,
            id: id.to_string(),
            guard: None,
        };
        lease.guard = Some(lock.lock_owned().await);
        lease
    }
}

/// Holds the per-ID lock and drops the map entry once nobody else needs it.
struct IdLease<'a> {
    locks: &'a LockMap,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for IdLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.guard.take();
        if let Some(lock) = locks.get(&self.id) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(&self.id);
            }
        }
    }
}
