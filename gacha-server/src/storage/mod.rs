//! Storage Layer - persisted player state
//!
//! Two stores behind the repository traits:
//! - **Account store**: signed-in players, keyed by user id, with a change feed
//! - **LMDB local store**: guest players, keyed by device id
//!
//! ## Architecture
//! ```text
//! [PlayerSessions]
//!       ↓
//! [Repository Trait]
//!       ↓
//! ┌────────────────────┬────────────────┐
//! │ MemoryAccountStore │ LmdbLocalStore │
//! │ (accounts + feed)  │ (guests)       │
//! └────────────────────┴────────────────┘
//! ```

pub mod lmdb_local;
pub mod memory_store;
pub mod repository;

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use self::lmdb_local::{LmdbLocalStore, StorageError};
use self::memory_store::MemoryAccountStore;
use self::repository::StorageManager;

/// Open the guest store and pair it with an in-process account store
pub fn init_storage<P: AsRef<Path>>(
    lmdb_path: P,
    lmdb_max_size: usize,
) -> Result<StorageManager, StorageError> {
    let local = LmdbLocalStore::new(lmdb_path, lmdb_max_size)?;
    info!("Storage layer initialized");
    Ok(StorageManager {
        accounts: Arc::new(MemoryAccountStore::default()),
        local: Arc::new(local),
    })
}
