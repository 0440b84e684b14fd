//! Centralized tuning constants for the summon engine.
//!
//! Defaults for [`crate::config::GachaConfig`] are built from these values.
//! Per-module tables (ability pools, personality lookups) stay in their
//! respective modules as the single source of truth.

use crate::entity::Rarity;

// =====================================================
// Rarity Ladder
// =====================================================

/// Base rarity weights before pity adjustment
pub const BASE_RARITY_WEIGHTS: [(Rarity, f64); 4] = [
    (Rarity::Common, 60.0),
    (Rarity::Rare, 30.0),
    (Rarity::Legendary, 9.0),
    (Rarity::Mythic, 1.0),
];

// =====================================================
// Pity / Guarantee
// =====================================================

/// Pulls without legendary-or-above after which soft pity starts ramping
pub const PITY_SOFT_THRESHOLD: u32 = 50;

/// Pulls without legendary-or-above that force the next pull to legendary-or-above
pub const PITY_HARD_CAP: u32 = 90;

/// Per-pull multiplier increment applied to legendary/mythic weights past the soft threshold
pub const PITY_SOFT_RAMP: f64 = 0.25;

/// Every Nth legendary-tier pull is upgraded to mythic
pub const MYTHIC_GUARANTEE_CAP: u32 = 10;

// =====================================================
// Generation
// =====================================================

/// Independent shiny roll probability (1/512)
pub const SHINY_ODDS: f64 = 1.0 / 512.0;

/// Weight added to an entity type for every matching modifier tag
pub const TAG_NUDGE_WEIGHT: f64 = 15.0;

/// Baseline weight of every entity type
pub const BASE_TYPE_WEIGHT: f64 = 10.0;

/// Weight added to a banner's featured type
pub const FEATURED_TYPE_WEIGHT: f64 = 20.0;

/// Power added per streak day
pub const STREAK_POWER_PER_DAY: f64 = 1.0;

/// Streak days beyond this add no more power
pub const STREAK_POWER_MAX_DAYS: u32 = 30;

// =====================================================
// Economy
// =====================================================

/// Crystal cost of a single pull on the standard banner
pub const PULL_COST_CRYSTALS: u64 = 50;

/// Size of a discounted bundle pull
pub const MULTI_PULL_SIZE: u32 = 10;

/// Crystal cost of a full bundle (10 pulls for the price of 9)
pub const MULTI_PULL_COST_CRYSTALS: u64 = 450;

/// Energy consumed per pull
pub const PULL_ENERGY_COST: u32 = 1;

/// Essence granted per point of power when an entity is sacrificed
pub const SACRIFICE_ESSENCE_RATIO: f64 = 0.75;

// =====================================================
// Energy
// =====================================================

/// Default energy cap
pub const DEFAULT_MAX_ENERGY: u32 = 10;

/// Default seconds per regenerated energy point
pub const DEFAULT_ENERGY_REGEN_SECS: u64 = 300;

// =====================================================
// Account Tiers
// =====================================================

pub const GUEST_MAX_PULLS_PER_REQUEST: u32 = 1;
pub const GUEST_INVENTORY_CAPACITY: usize = 50;
pub const GUEST_BASE_CRYSTAL_GRANT: u64 = 300;

pub const FULL_MAX_PULLS_PER_REQUEST: u32 = 10;
pub const FULL_INVENTORY_CAPACITY: usize = 500;
pub const FULL_BASE_CRYSTAL_GRANT: u64 = 1000;

// =====================================================
// Progression
// =====================================================

/// Season XP needed per season pass level
pub const SEASON_XP_PER_LEVEL: u64 = 1000;

/// Highest reachable season pass level
pub const SEASON_MAX_LEVEL: u32 = 50;

/// Seconds in a UTC day (streak day boundaries)
pub const SECONDS_PER_DAY: u64 = 86_400;
