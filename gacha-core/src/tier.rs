//! Account tiers (guest vs full).

use serde::{Deserialize, Serialize};

use crate::constants::{
    FULL_BASE_CRYSTAL_GRANT, FULL_INVENTORY_CAPACITY, FULL_MAX_PULLS_PER_REQUEST,
    GUEST_BASE_CRYSTAL_GRANT, GUEST_INVENTORY_CAPACITY, GUEST_MAX_PULLS_PER_REQUEST,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    Guest,
    Full,
}

impl TierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierKind::Guest => "guest",
            TierKind::Full => "full",
        }
    }
}

/// Limits attached to a tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTier {
    pub kind: TierKind,
    pub max_pulls_per_request: u32,
    pub inventory_capacity: usize,
    /// Crystals granted when the account is first created
    pub base_crystal_grant: u64,
}

impl AccountTier {
    pub fn guest() -> Self {
        Self {
            kind: TierKind::Guest,
            max_pulls_per_request: GUEST_MAX_PULLS_PER_REQUEST,
            inventory_capacity: GUEST_INVENTORY_CAPACITY,
            base_crystal_grant: GUEST_BASE_CRYSTAL_GRANT,
        }
    }

    pub fn full() -> Self {
        Self {
            kind: TierKind::Full,
            max_pulls_per_request: FULL_MAX_PULLS_PER_REQUEST,
            inventory_capacity: FULL_INVENTORY_CAPACITY,
            base_crystal_grant: FULL_BASE_CRYSTAL_GRANT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    pub guest: AccountTier,
    pub full: AccountTier,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            guest: AccountTier::guest(),
            full: AccountTier::full(),
        }
    }
}

impl TierTable {
    pub fn get(&self, kind: TierKind) -> &AccountTier {
        match kind {
            TierKind::Guest => &self.guest,
            TierKind::Full => &self.full,
        }
    }
}
