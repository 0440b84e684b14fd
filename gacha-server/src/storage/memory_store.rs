//! In-memory account store with per-user change feeds
//!
//! Records are kept as encoded save envelopes so every load goes through the
//! same checksum and migration path as the on-device store.

use async_trait::async_trait;
use gacha_core::savemigration::{decode_save, encode_save};
use gacha_core::PersistedState;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::debug;

use super::repository::{AccountStateRepo, RepoResult};

const DEFAULT_FEED_CAPACITY: usize = 16;

pub struct MemoryAccountStore {
    records: RwLock<HashMap<String, String>>,
    feeds: Mutex<HashMap<String, broadcast::Sender<PersistedState>>>,
    feed_capacity: usize,
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl MemoryAccountStore {
    pub fn new(feed_capacity: usize) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            feeds: Mutex::new(HashMap::new()),
            feed_capacity: feed_capacity.max(1),
        }
    }

    /// Raw envelope for a user, as another device would read it
    pub fn envelope(&self, user_id: &str) -> Option<String> {
        self.records.read().get(user_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Change feeds currently kept for subscribers
    pub fn feed_count(&self) -> usize {
        self.feeds.lock().len()
    }

    /// Send to the user's feed. A feed nobody listens to is dropped.
    fn publish(&self, user_id: &str, state: &PersistedState) -> usize {
        let mut feeds = self.feeds.lock();
        let Some(sender) = feeds.get(user_id) else {
            return 0;
        };
        match sender.send(state.clone()) {
            Ok(receivers) => receivers,
            Err(_) => {
                feeds.remove(user_id);
                0
            }
        }
    }
}

#[async_trait]
impl AccountStateRepo for MemoryAccountStore {
    async fn load(&self, user_id: &str) -> RepoResult<Option<PersistedState>> {
        let Some(encoded) = self.envelope(user_id) else {
            return Ok(None);
        };
        let (state, _) = decode_save(&encoded)?;
        Ok(Some(state))
    }

    async fn save(&self, user_id: &str, state: &PersistedState) -> RepoResult<()> {
        let encoded = encode_save(state)?;
        self.records.write().insert(user_id.to_string(), encoded);

        // No subscribers is not an error
        let receivers = self.publish(user_id, state);
        debug!(user_id, receivers, "account state saved");
        Ok(())
    }

    async fn subscribe(&self, user_id: &str) -> RepoResult<broadcast::Receiver<PersistedState>> {
        let mut feeds = self.feeds.lock();
        feeds.retain(|_, sender| sender.receiver_count() > 0);
        let sender = feeds
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(self.feed_capacity).0);
        Ok(sender.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gacha_core::energy::EnergyConfig;
    use gacha_core::{AccountTier, PlayerState, TierKind};

    fn full_state(crystals: u64) -> PersistedState {
        let mut player = PlayerState::new(&AccountTier::full(), &EnergyConfig::default(), 0);
        player.ledger.crystals = crystals;
        PersistedState::new(TierKind::Full, player, 0)
    }

    #[tokio::test]
    async fn test_save_load() {
        let store = MemoryAccountStore::default();
        assert!(store.load("u1").await.unwrap().is_none());

        store.save("u1", &full_state(77)).await.unwrap();
        let loaded = store.load("u1").await.unwrap().unwrap();
        assert_eq!(loaded.player.ledger.crystals, 77);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_saves() {
        let store = MemoryAccountStore::default();
        let mut rx = store.subscribe("u1").await.unwrap();
        let mut other = store.subscribe("u2").await.unwrap();

        store.save("u1", &full_state(5)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().player.ledger.crystals, 5);
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_abandoned_feeds_are_dropped() {
        let store = MemoryAccountStore::default();
        store.save("nobody", &full_state(1)).await.unwrap();
        assert_eq!(store.feed_count(), 0);

        let rx = store.subscribe("u1").await.unwrap();
        assert_eq!(store.feed_count(), 1);
        drop(rx);
        store.save("u1", &full_state(2)).await.unwrap();
        assert_eq!(store.feed_count(), 0);

        // A dead feed is also swept when someone else subscribes
        let stale = store.subscribe("u2").await.unwrap();
        drop(stale);
        let _live = store.subscribe("u3").await.unwrap();
        assert_eq!(store.feed_count(), 1);
    }
}
