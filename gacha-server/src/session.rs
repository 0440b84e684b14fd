//! Per-user session service.
//!
//! Each owner (signed-in account or guest device) gets one session behind a
//! tokio mutex, so requests for the same owner run strictly one after another
//! while different owners proceed in parallel. Every mutation runs on a
//! working copy, is persisted, and only then replaces the session state; a
//! failed save leaves the session exactly as it was.
//!
//! Sessions live in an LRU map. Eviction skips sessions that a request is
//! still holding.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use gacha_core::events::SacrificeEvent;
use gacha_core::progression::LoginOutcome;
use gacha_core::rewards::{apply_reward, RewardDescriptor, RewardReceipt};
use gacha_core::{
    perform_pull, AccountTier, EntityGenerator, EventSink, GachaConfig, GachaError, GachaEvent,
    GachaRng, GenerationModifiers, PersistedState, PlayerState, PullContext, PullOutcome,
    PullStatus, TierKind,
};
use gacha_core::rng::derive_seed;
use lru::LruCache;
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::metrics::ServiceMetrics;
use crate::storage::repository::{RepoResult, StorageManager};
use crate::tier::TierResolver;

/// Own saves remembered per watched account, so their echoes on the change
/// feed are not mistaken for remote writes
const MAX_PENDING_ECHOES: usize = 64;

pub const DEFAULT_SESSION_CAPACITY: usize = 1024;

/// Who a session belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    Account(String),
    Guest(String),
}

impl Owner {
    pub fn tier_kind(&self) -> TierKind {
        match self {
            Owner::Account(_) => TierKind::Full,
            Owner::Guest(_) => TierKind::Guest,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Account(user) => write!(f, "account:{}", user),
            Owner::Guest(device) => write!(f, "guest:{}", device),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Gacha(#[from] GachaError),
    #[error("Unknown banner: {0}")]
    UnknownBanner(String),
    #[error("Storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
    #[error("Account {0} already has saved progress")]
    AccountExists(String),
    #[error("No guest progress for device {0}")]
    NoGuestState(String),
}

impl ServiceError {
    /// True when the request itself was refused (bad count, funds, energy...)
    pub fn is_rejection(&self) -> bool {
        match self {
            ServiceError::Gacha(err) => err.is_user_facing(),
            ServiceError::UnknownBanner(_) => true,
            _ => false,
        }
    }
}

struct Session {
    state: PersistedState,
    rng: GachaRng,
}

/// Unregisters a watched account when its feed task ends or is aborted
struct WatchRegistration {
    service: Arc<PlayerSessions>,
    owner: Owner,
}

impl Drop for WatchRegistration {
    fn drop(&mut self) {
        self.service.watches.lock().remove(&self.owner);
    }
}

pub struct PlayerSessions {
    config: Arc<GachaConfig>,
    generator: EntityGenerator,
    storage: StorageManager,
    tiers: Arc<dyn TierResolver>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    metrics: Arc<ServiceMetrics>,
    sessions: Mutex<LruCache<Owner, Arc<AsyncMutex<Session>>>>,
    /// Watched accounts and their pending own-save echoes. Kept outside the
    /// sessions so eviction does not forget them.
    watches: Mutex<HashMap<Owner, VecDeque<PersistedState>>>,
    capacity: usize,
    seed: Option<u64>,
}

impl PlayerSessions {
    pub fn new(
        config: Arc<GachaConfig>,
        storage: StorageManager,
        tiers: Arc<dyn TierResolver>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            generator: config.generator(),
            config,
            storage,
            tiers,
            clock,
            sink,
            metrics,
            sessions: Mutex::new(LruCache::unbounded()),
            watches: Mutex::new(HashMap::new()),
            capacity: DEFAULT_SESSION_CAPACITY,
            seed: None,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Deterministic RNG streams, derived from `seed`, the owner and how many
    /// pulls the owner has made so far
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Drop a cached session; the next request reloads it from storage.
    /// A session a request is still holding stays put and this returns false.
    pub fn evict(&self, owner: &Owner) -> bool {
        let mut cache = self.sessions.lock();
        match cache.peek(owner) {
            Some(session) if Arc::strong_count(session) == 1 => cache.pop(owner).is_some(),
            _ => false,
        }
    }

    pub fn is_watching(&self, user_id: &str) -> bool {
        self.watches
            .lock()
            .contains_key(&Owner::Account(user_id.to_string()))
    }

    // ========================================================================
    // Operations
    // ========================================================================

    pub async fn pull(
        &self,
        owner: &Owner,
        banner_id: &str,
        count: u32,
    ) -> Result<PullOutcome, ServiceError> {
        self.pull_with(owner, banner_id, count, &GenerationModifiers::default())
            .await
    }

    /// Pull with caller-supplied generation modifiers (weather, temperature...)
    pub async fn pull_with(
        &self,
        owner: &Owner,
        banner_id: &str,
        count: u32,
        modifiers: &GenerationModifiers,
    ) -> Result<PullOutcome, ServiceError> {
        let Some(banner) = self.config.banner(banner_id).cloned() else {
            self.metrics.record_rejected();
            return Err(ServiceError::UnknownBanner(banner_id.to_string()));
        };

        let outcome = self
            .mutate(owner, |player, tier, rng, now| {
                let ctx = PullContext {
                    tier,
                    pity: &self.config.pity,
                    generator: &self.generator,
                    modifiers,
                    now,
                };
                Ok(perform_pull(player, &banner, count, &ctx, rng)?)
            })
            .await?;

        self.metrics.record_pull(
            outcome.entities.len(),
            outcome.status == PullStatus::PartialStorage,
        );
        let events: Vec<GachaEvent> = outcome
            .events
            .iter()
            .cloned()
            .map(GachaEvent::Pull)
            .collect();
        self.sink.emit_all(&events);
        Ok(outcome)
    }

    /// Spend energy outside of a pull; returns what is left
    pub async fn spend_energy(&self, owner: &Owner, amount: u32) -> Result<u32, ServiceError> {
        self.mutate(owner, |player, _, _, now| {
            player.energy.tick(now);
            player.energy.spend(amount)?;
            Ok(player.energy.current)
        })
        .await
    }

    pub async fn sacrifice(
        &self,
        owner: &Owner,
        entity_id: &str,
    ) -> Result<SacrificeEvent, ServiceError> {
        let ratio = self.config.sacrifice_ratio;
        let event = self
            .mutate(owner, |player, _, _, now| {
                Ok(player.sacrifice(entity_id, ratio, now)?)
            })
            .await?;
        self.sink.emit(&GachaEvent::Sacrifice(event.clone()));
        Ok(event)
    }

    pub async fn claim_reward(
        &self,
        owner: &Owner,
        reward: &RewardDescriptor,
    ) -> Result<RewardReceipt, ServiceError> {
        let receipt = self
            .mutate(owner, |player, _, _, now| Ok(apply_reward(player, reward, now)))
            .await?;
        self.sink.emit(&GachaEvent::Reward(receipt.clone()));
        Ok(receipt)
    }

    pub async fn record_login(&self, owner: &Owner) -> Result<LoginOutcome, ServiceError> {
        let (outcome, streak) = self
            .mutate(owner, |player, _, _, now| {
                let outcome = player.record_login(now);
                Ok((outcome, player.streak.current))
            })
            .await?;
        self.sink.emit(&GachaEvent::Login { outcome, streak });
        Ok(outcome)
    }

    /// Current state with energy regenerated up to now (nothing is written)
    pub async fn snapshot(&self, owner: &Owner) -> Result<PersistedState, ServiceError> {
        let session = self.session(owner).await?;
        let guard = session.lock().await;
        let mut view = guard.state.clone();
        view.player.energy = view.player.energy.at(self.clock.now());
        Ok(view)
    }

    /// Replace a session wholesale with a state written elsewhere.
    ///
    /// Returns false when `remote` is one of this service's own saves or
    /// matches what the session already holds.
    pub async fn apply_remote(
        &self,
        owner: &Owner,
        remote: PersistedState,
    ) -> Result<bool, ServiceError> {
        let session = self.session(owner).await?;
        let mut guard = session.lock().await;

        if self.take_echo(owner, &remote) || guard.state == remote {
            return Ok(false);
        }

        info!(%owner, "remote change replaced session state");
        guard.state = remote;
        self.metrics.record_resync();
        Ok(true)
    }

    /// Follow the account store's change feed for `user_id` until it closes.
    ///
    /// Returns `None` when the account is already being watched.
    pub async fn watch_account(
        self: &Arc<Self>,
        user_id: &str,
    ) -> Result<Option<JoinHandle<()>>, ServiceError> {
        let owner = Owner::Account(user_id.to_string());
        {
            let mut watches = self.watches.lock();
            if watches.contains_key(&owner) {
                return Ok(None);
            }
            watches.insert(owner.clone(), VecDeque::new());
        }
        let registration = WatchRegistration {
            service: Arc::clone(self),
            owner: owner.clone(),
        };

        let mut rx = self
            .storage
            .accounts
            .subscribe(user_id)
            .await
            .map_err(ServiceError::Storage)?;

        Ok(Some(tokio::spawn(async move {
            let service = Arc::clone(&registration.service);
            loop {
                match rx.recv().await {
                    Ok(remote) => {
                        if let Err(err) = service.apply_remote(&owner, remote).await {
                            error!(%owner, %err, "failed to apply remote change");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%owner, skipped, "change feed lagged, reloading");
                        service.resync_from_store(&owner).await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            drop(registration);
        })))
    }

    /// Move guest progress into an empty account. One-way: the local record is
    /// deleted and the account starts at full tier.
    pub async fn upgrade_guest(
        &self,
        device_id: &str,
        user_id: &str,
    ) -> Result<PersistedState, ServiceError> {
        let guest_owner = Owner::Guest(device_id.to_string());
        let account_owner = Owner::Account(user_id.to_string());

        // Always guest first, then account. Every other path holds at most
        // one session, so this order cannot deadlock.
        let guest_session = self.session(&guest_owner).await?;
        let account_session = self.session(&account_owner).await?;
        let mut guest_guard = guest_session.lock().await;
        let mut account_guard = account_session.lock().await;

        let guest = self
            .storage
            .local
            .load(device_id)
            .await
            .map_err(ServiceError::Storage)?
            .ok_or_else(|| ServiceError::NoGuestState(device_id.to_string()))?;

        // Checked under the account lock so two upgrades cannot both see it empty
        if self
            .storage
            .accounts
            .load(user_id)
            .await
            .map_err(ServiceError::Storage)?
            .is_some()
        {
            self.metrics.record_rejected();
            return Err(ServiceError::AccountExists(user_id.to_string()));
        }

        let now = self.clock.now();
        let guest_tier = self.tiers.resolve(TierKind::Guest);
        let full_tier = self.tiers.resolve(TierKind::Full);
        let mut player = guest.player;
        let top_up = full_tier
            .base_crystal_grant
            .saturating_sub(guest_tier.base_crystal_grant);
        player.ledger.crystals = player.ledger.crystals.saturating_add(top_up);
        let upgraded = PersistedState::new(TierKind::Full, player, now);

        self.save_for(&account_owner, &upgraded).await?;
        self.remember_echo(&account_owner, &upgraded);
        if let Err(err) = self.storage.local.delete(device_id).await {
            // The account copy is authoritative from here on
            error!(device_id, %err, "failed to delete guest record after upgrade");
        }

        // Requests already queued on either session see the post-upgrade world
        account_guard.state = upgraded.clone();
        let fresh = PlayerState::new(&guest_tier, &self.config.energy, now);
        guest_guard.state = PersistedState::new(TierKind::Guest, fresh, now);

        info!(device_id, user_id, top_up, "guest upgraded to account");
        Ok(upgraded)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn mutate<T, F>(&self, owner: &Owner, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut PlayerState, &AccountTier, &mut GachaRng, u64) -> Result<T, ServiceError>
            + Send,
    {
        let session = self.session(owner).await?;
        let mut guard = session.lock().await;
        let session = &mut *guard;

        let now = self.clock.now();
        let tier = self.tiers.resolve(session.state.tier);
        let mut working = session.state.clone();

        let value = match op(&mut working.player, &tier, &mut session.rng, now) {
            Ok(value) => value,
            Err(err) => {
                if err.is_rejection() {
                    self.metrics.record_rejected();
                }
                return Err(err);
            }
        };

        working.updated_at = now;
        self.save_for(owner, &working).await?;
        self.remember_echo(owner, &working);
        session.state = working;
        Ok(value)
    }

    /// Must run while the owner's session lock is held, before the feed task
    /// can compare the echo in `apply_remote`
    fn remember_echo(&self, owner: &Owner, state: &PersistedState) {
        let mut watches = self.watches.lock();
        if let Some(echoes) = watches.get_mut(owner) {
            echoes.push_back(state.clone());
            while echoes.len() > MAX_PENDING_ECHOES {
                echoes.pop_front();
            }
        }
    }

    fn take_echo(&self, owner: &Owner, remote: &PersistedState) -> bool {
        let mut watches = self.watches.lock();
        let Some(echoes) = watches.get_mut(owner) else {
            return false;
        };
        match echoes.iter().position(|own| own == remote) {
            Some(pos) => {
                echoes.drain(..=pos);
                true
            }
            None => false,
        }
    }

    async fn save_for(&self, owner: &Owner, state: &PersistedState) -> Result<(), ServiceError> {
        let result: RepoResult<()> = match owner {
            Owner::Account(user) => self.storage.accounts.save(user, state).await,
            Owner::Guest(device) => self.storage.local.save(device, state).await,
        };
        match result {
            Ok(()) => {
                self.metrics.record_save(true);
                Ok(())
            }
            Err(err) => {
                error!(%owner, %err, "save failed, session left unchanged");
                self.metrics.record_save(false);
                Err(ServiceError::Storage(err))
            }
        }
    }

    async fn load_for(&self, owner: &Owner) -> Result<Option<PersistedState>, ServiceError> {
        let loaded = match owner {
            Owner::Account(user) => self.storage.accounts.load(user).await,
            Owner::Guest(device) => self.storage.local.load(device).await,
        };
        loaded.map_err(ServiceError::Storage)
    }

    async fn resync_from_store(&self, owner: &Owner) {
        match self.load_for(owner).await {
            Ok(Some(remote)) => {
                if let Err(err) = self.apply_remote(owner, remote).await {
                    error!(%owner, %err, "resync failed");
                }
            }
            Ok(None) => {}
            Err(err) => error!(%owner, %err, "resync load failed"),
        }
    }

    async fn session(&self, owner: &Owner) -> Result<Arc<AsyncMutex<Session>>, ServiceError> {
        let cached = { self.sessions.lock().get(owner).cloned() };
        if let Some(session) = cached {
            return Ok(session);
        }

        let now = self.clock.now();
        let state = match self.load_for(owner).await? {
            Some(state) => state,
            None => {
                let kind = owner.tier_kind();
                let tier = self.tiers.resolve(kind);
                PersistedState::new(kind, PlayerState::new(&tier, &self.config.energy, now), now)
            }
        };

        let mut cache = self.sessions.lock();
        // Another request may have loaded it while we were waiting on storage
        if let Some(existing) = cache.get(owner).cloned() {
            return Ok(existing);
        }
        let rng = self.rng_for(owner, &state);
        let session = Arc::new(AsyncMutex::new(Session { state, rng }));
        cache.put(owner.clone(), Arc::clone(&session));
        self.evict_idle(&mut cache);
        Ok(session)
    }

    /// Seeded streams never restart for an owner: a reloaded session picks
    /// up at its pull count instead of replaying earlier draws
    fn rng_for(&self, owner: &Owner, state: &PersistedState) -> GachaRng {
        let Some(seed) = self.seed else {
            return GachaRng::from_entropy();
        };
        let owner_key = owner.to_string();
        let pulls = state.player.stats.total_pulls.to_le_bytes();
        GachaRng::from_seed(derive_seed(seed, &[owner_key.as_bytes(), &pulls]))
    }

    fn evict_idle(&self, cache: &mut LruCache<Owner, Arc<AsyncMutex<Session>>>) {
        while cache.len() > self.capacity {
            // Least recently used first; a session someone still holds is skipped
            let idle = cache
                .iter()
                .rev()
                .find(|(_, session)| Arc::strong_count(session) == 1)
                .map(|(owner, _)| owner.clone());
            match idle {
                Some(owner) => {
                    cache.pop(&owner);
                }
                None => break,
            }
        }
    }
}
