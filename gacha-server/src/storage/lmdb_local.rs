//! LMDB Local Store - guest progress persisted on the device
//!
//! One database, keyed by device id, holding the checksummed save envelope
//! produced by `gacha_core::savemigration::encode_save`. Older envelopes are
//! migrated forward on read.

use async_trait::async_trait;
use gacha_core::savemigration::{decode_save, encode_save, SaveError};
use gacha_core::PersistedState;
use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::repository::{LocalStateRepo, RepoResult};

/// Error type for LMDB local store operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),
    #[error("Save envelope error: {0}")]
    Save(#[from] SaveError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// LMDB-backed guest store
pub struct LmdbLocalStore {
    env: Arc<Env>,
    saves: Database<Str, Str>,
}

impl LmdbLocalStore {
    /// Open or create the store
    ///
    /// # Arguments
    /// * `path` - Directory for LMDB data files
    /// * `max_size` - Maximum map size in bytes
    pub fn new<P: AsRef<Path>>(path: P, max_size: usize) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size)
                .max_dbs(1)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let saves = env.create_database::<Str, Str>(&mut wtxn, Some("guest_saves"))?;
        wtxn.commit()?;

        info!("LMDB guest store opened ({}MB)", max_size / (1024 * 1024));

        Ok(Self {
            env: Arc::new(env),
            saves,
        })
    }

    pub fn put(&self, device_id: &str, state: &PersistedState) -> Result<(), StorageError> {
        let encoded = encode_save(state)?;
        let mut wtxn = self.env.write_txn()?;
        self.saves.put(&mut wtxn, device_id, &encoded)?;
        wtxn.commit()?;
        debug!("Stored guest save: {}", device_id);
        Ok(())
    }

    pub fn get(&self, device_id: &str) -> Result<Option<PersistedState>, StorageError> {
        let rtxn = self.env.read_txn()?;
        let Some(encoded) = self.saves.get(&rtxn, device_id)? else {
            return Ok(None);
        };
        let (state, report) = decode_save(encoded)?;
        if report.migrated() {
            debug!(
                "Migrated guest save {} from v{} to v{}",
                device_id, report.original_version, report.final_version
            );
        }
        Ok(Some(state))
    }

    /// Store a raw envelope without re-encoding (imports from older clients)
    pub fn put_raw(&self, device_id: &str, envelope: &str) -> Result<(), StorageError> {
        let mut wtxn = self.env.write_txn()?;
        self.saves.put(&mut wtxn, device_id, envelope)?;
        wtxn.commit()?;
        Ok(())
    }

    pub fn delete(&self, device_id: &str) -> Result<bool, StorageError> {
        let mut wtxn = self.env.write_txn()?;
        let deleted = self.saves.delete(&mut wtxn, device_id)?;
        wtxn.commit()?;
        if !deleted {
            warn!("Delete of unknown guest save: {}", device_id);
        }
        Ok(deleted)
    }

    pub fn count(&self) -> Result<usize, StorageError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.saves.len(&rtxn)? as usize)
    }
}

// ============================================================================
// Repository adapter
// ============================================================================

#[async_trait]
impl LocalStateRepo for LmdbLocalStore {
    async fn load(&self, device_id: &str) -> RepoResult<Option<PersistedState>> {
        Ok(self.get(device_id)?)
    }

    async fn save(&self, device_id: &str, state: &PersistedState) -> RepoResult<()> {
        Ok(self.put(device_id, state)?)
    }

    async fn delete(&self, device_id: &str) -> RepoResult<bool> {
        Ok(LmdbLocalStore::delete(self, device_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gacha_core::energy::EnergyConfig;
    use gacha_core::{AccountTier, PlayerState, TierKind};

    fn guest_state(now: u64) -> PersistedState {
        let player = PlayerState::new(&AccountTier::guest(), &EnergyConfig::default(), now);
        PersistedState::new(TierKind::Guest, player, now)
    }

    #[test]
    fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbLocalStore::new(dir.path(), 10 * 1024 * 1024).unwrap();
        let state = guest_state(100);

        assert!(store.get("device-a").unwrap().is_none());
        store.put("device-a", &state).unwrap();
        assert_eq!(store.get("device-a").unwrap(), Some(state));
        assert_eq!(store.count().unwrap(), 1);

        assert!(store.delete("device-a").unwrap());
        assert!(!store.delete("device-a").unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_corrupt_envelope_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbLocalStore::new(dir.path(), 10 * 1024 * 1024).unwrap();
        let mut encoded = encode_save(&guest_state(5)).unwrap();
        encoded = encoded.replace("\"updated_at\":5", "\"updated_at\":6");
        store.put_raw("device-b", &encoded).unwrap();

        assert!(matches!(
            store.get("device-b"),
            Err(StorageError::Save(SaveError::ChecksumMismatch { .. }))
        ));
    }
}
