//! Store selection from configuration.

use crate::{ActorRunStore, InMemoryRunStore};
use scriptorium_error::ScriptoriumResult;
use scriptorium_interface::RunStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Which run store implementation to use.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreKind {
    /// Map of per-run locks
    #[default]
    Memory,
    /// Single ractor actor owning every run
    Actor,
}

/// Storage configuration.
///
/// ```toml
/// [storage]
/// store = "actor"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store implementation
    #[serde(default)]
    pub store: StoreKind,
}

/// Create the store selected by `config`.
///
/// # Errors
///
/// Returns a backend error if the actor store fails to start.
pub async fn create_store(config: &StorageConfig) -> ScriptoriumResult<Arc<dyn RunStore>> {
    info!(store = %config.store, "Creating run store");
    let store: Arc<dyn RunStore> = match config.store {
        StoreKind::Memory => Arc::new(InMemoryRunStore::new()),
        StoreKind::Actor => Arc::new(ActorRunStore::spawn().await?),
    };
    Ok(store)
}
