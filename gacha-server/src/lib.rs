//! Summon Engine Server Library
//!
//! Async host around `gacha_core`:
//! - Repository traits for the account store and the guest local store
//! - In-memory account store with per-user change feeds
//! - LMDB-backed guest store
//! - Per-user serialized session service
//! - Event sinks, tier resolver, clock, metrics

pub mod clock;
pub mod events; // Broadcast + tracing event sinks
pub mod metrics; // Service counters (JSON export)
pub mod session;
pub mod storage; // Account store + LMDB guest store
pub mod tier;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{BroadcastEventSink, TracingEventSink};
pub use metrics::ServiceMetrics;
pub use session::{Owner, PlayerSessions, ServiceError};
pub use storage::lmdb_local::{LmdbLocalStore, StorageError};
pub use storage::memory_store::MemoryAccountStore;
pub use storage::repository::{AccountStateRepo, LocalStateRepo, RepoResult, StorageManager};
pub use tier::{ConfigTierResolver, TierResolver};
