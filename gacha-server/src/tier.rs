//! Account tier resolution

use gacha_core::{AccountTier, TierKind, TierTable};

/// Maps a tier kind to its limits
pub trait TierResolver: Send + Sync {
    fn resolve(&self, kind: TierKind) -> AccountTier;
}

/// Resolver backed by the tier table from `GachaConfig`
#[derive(Debug, Clone, Default)]
pub struct ConfigTierResolver {
    table: TierTable,
}

impl ConfigTierResolver {
    pub fn new(table: TierTable) -> Self {
        Self { table }
    }
}

impl TierResolver for ConfigTierResolver {
    fn resolve(&self, kind: TierKind) -> AccountTier {
        self.table.get(kind).clone()
    }
}
