//! Per-user player state and its persisted envelope.
//!
//! `PlayerState` is the single consistency domain: every mutation of a
//! user's ledger, energy, pity, collection or progression goes through one
//! value of it. Nothing here holds a float so the canonical JSON form used
//! for save checksums is stable.

use serde::{Deserialize, Serialize};

use crate::energy::{EnergyConfig, EnergyState};
use crate::error::GachaResult;
use crate::events::SacrificeEvent;
use crate::ledger::{self, Collection, Ledger};
use crate::pity::PullState;
use crate::progression::{DailyStreak, LoginOutcome, SeasonPass};
use crate::tier::{AccountTier, TierKind};

/// Lifetime counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub total_pulls: u64,
    pub total_sacrificed: u64,
    pub shiny_pulls: u64,
    pub essence_earned: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub ledger: Ledger,
    pub energy: EnergyState,
    pub pulls: PullState,
    pub collection: Collection,
    #[serde(default)]
    pub streak: DailyStreak,
    #[serde(default)]
    pub season: SeasonPass,
    #[serde(default)]
    pub stats: PlayerStats,
}

impl PlayerState {
    /// Fresh state with the tier's starting crystals and full energy
    pub fn new(tier: &AccountTier, energy: &EnergyConfig, now: u64) -> Self {
        Self {
            ledger: Ledger::new(0, tier.base_crystal_grant),
            energy: EnergyState::full(energy, now),
            pulls: PullState::default(),
            collection: Collection::default(),
            streak: DailyStreak::default(),
            season: SeasonPass::default(),
            stats: PlayerStats::default(),
        }
    }

    /// Destroy an owned entity for essence
    pub fn sacrifice(
        &mut self,
        entity_id: &str,
        ratio: f64,
        now: u64,
    ) -> GachaResult<SacrificeEvent> {
        let event =
            ledger::sacrifice(&mut self.ledger, &mut self.collection, entity_id, ratio, now)?;
        self.stats.total_sacrificed = self.stats.total_sacrificed.saturating_add(1);
        self.stats.essence_earned = self.stats.essence_earned.saturating_add(event.essence_granted);
        Ok(event)
    }

    pub fn record_login(&mut self, now: u64) -> LoginOutcome {
        self.energy.tick(now);
        self.streak.record_login(now)
    }
}

/// What the account and guest stores hold for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub tier: TierKind,
    pub player: PlayerState,
    pub updated_at: u64,
}

impl PersistedState {
    pub fn new(tier: TierKind, player: PlayerState, updated_at: u64) -> Self {
        Self {
            version: crate::savemigration::CURRENT_SAVE_VERSION,
            tier,
            player,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_gets_tier_grant() {
        let state = PlayerState::new(&AccountTier::guest(), &EnergyConfig::default(), 100);
        assert_eq!(state.ledger.crystals, 300);
        assert_eq!(state.ledger.essence, 0);
        assert!(state.energy.is_full());
        assert_eq!(state.energy.last_update, 100);
        assert!(state.collection.is_empty());
    }

    #[test]
    fn test_sacrifice_updates_stats() {
        use crate::entity::{EntityGenerator, GenerationModifiers};
        use crate::rng::GachaRng;

        let mut state = PlayerState::new(&AccountTier::full(), &EnergyConfig::default(), 0);
        let entity = EntityGenerator::default()
            .generate(
                &crate::constants::BASE_RARITY_WEIGHTS,
                &GenerationModifiers::default(),
                &mut GachaRng::from_seed(9),
                0,
            )
            .unwrap();
        let id = entity.id.clone();
        let expected = ledger::sacrifice_value(entity.power, 0.75);
        state.collection.add_entity(entity, 10).unwrap();

        let event = state.sacrifice(&id, 0.75, 1).unwrap();
        assert_eq!(event.essence_granted, expected);
        assert_eq!(state.ledger.essence, expected);
        assert_eq!(state.stats.total_sacrificed, 1);
        assert!(state.sacrifice(&id, 0.75, 2).is_err());
        assert_eq!(state.stats.total_sacrificed, 1);
    }

    #[test]
    fn test_persisted_state_json_roundtrip() {
        let player = PlayerState::new(&AccountTier::full(), &EnergyConfig::default(), 7);
        let persisted = PersistedState::new(TierKind::Full, player, 7);
        let json = serde_json::to_string(&persisted).unwrap();
        let back: PersistedState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, persisted);
    }
}
