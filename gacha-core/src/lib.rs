//! Summon Engine - Core Library
//!
//! Deterministic gacha pull / reward-economy logic:
//! - Seedable weighted RNG
//! - Entity generation (rarity ladder, tag-nudged types, rarity-gated abilities)
//! - Pity and mythic guarantee counters
//! - Lazy energy regeneration
//! - Currency ledger and entity collection
//! - All-or-nothing pull orchestration
//! - Reward dispatch, login streak, season pass
//! - Versioned, checksummed saves with forward migration
//! - Monte-Carlo pity balance checks
//!
//! Everything here is synchronous; hosts own persistence and concurrency.

pub mod balance;
pub mod config;
pub mod constants;
pub mod energy;
pub mod entity;
pub mod error;
pub mod events;
pub mod gacha;
pub mod ledger;
pub mod logging;
pub mod pity;
pub mod progression;
pub mod rewards;
pub mod rng;
pub mod savemigration;
pub mod state;
pub mod tier;

pub use config::{ConfigError, GachaConfig};
pub use entity::{Entity, EntityGenerator, EntityType, GenerationModifiers, Personality, Rarity};
pub use error::{GachaError, GachaResult};
pub use events::{EventSink, GachaEvent, PullEvent, SacrificeEvent};
pub use gacha::{perform_pull, Banner, PullContext, PullOutcome, PullStatus};
pub use ledger::{Collection, Currency, Ledger};
pub use rng::GachaRng;
pub use state::{PersistedState, PlayerState};
pub use tier::{AccountTier, TierKind, TierTable};
