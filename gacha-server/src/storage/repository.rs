//! Repository traits - abstraction layer for persisted player state
//!
//! The session service only talks to these traits, so the cloud account
//! store and the on-device guest store can be swapped independently.

use async_trait::async_trait;
use gacha_core::PersistedState;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Generic result type for repository operations
pub type RepoResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ============================================================================
// Account store (cloud, keyed by user id)
// ============================================================================

/// Repository for signed-in accounts
#[async_trait]
pub trait AccountStateRepo: Send + Sync {
    async fn load(&self, user_id: &str) -> RepoResult<Option<PersistedState>>;
    async fn save(&self, user_id: &str, state: &PersistedState) -> RepoResult<()>;
    /// Every successful save for `user_id` is published here, including
    /// saves made by other devices.
    async fn subscribe(&self, user_id: &str) -> RepoResult<broadcast::Receiver<PersistedState>>;
}

// ============================================================================
// Local fallback store (guest, keyed by device id)
// ============================================================================

/// Repository for guest progress kept on the device
#[async_trait]
pub trait LocalStateRepo: Send + Sync {
    async fn load(&self, device_id: &str) -> RepoResult<Option<PersistedState>>;
    async fn save(&self, device_id: &str, state: &PersistedState) -> RepoResult<()>;
    /// Returns true when a record existed
    async fn delete(&self, device_id: &str) -> RepoResult<bool>;
}

/// Both stores, handed to the session service
#[derive(Clone)]
pub struct StorageManager {
    pub accounts: Arc<dyn AccountStateRepo>,
    pub local: Arc<dyn LocalStateRepo>,
}
