//! Reward dispatcher.
//!
//! Quest, achievement and daily-login systems live outside the engine and
//! hand in [`RewardDescriptor`]s; this module is the one place that turns a
//! descriptor into state changes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ledger::Currency;
use crate::state::PlayerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Essence,
    Crystals,
    Energy,
    SeasonXp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDescriptor {
    pub kind: RewardKind,
    pub amount: u64,
    /// Who granted it, e.g. `quest:daily_3`
    #[serde(default)]
    pub source: String,
}

impl RewardDescriptor {
    pub fn new(kind: RewardKind, amount: u64, source: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            source: source.into(),
        }
    }
}

/// What a reward actually did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardReceipt {
    pub kind: RewardKind,
    pub requested: u64,
    /// Less than `requested` when a cap (energy max, season level) absorbed the rest
    pub applied: u64,
    pub source: String,
    #[serde(default)]
    pub levels_gained: u32,
}

/// Apply a reward to `state`. Energy is ticked to `now` before granting.
pub fn apply_reward(state: &mut PlayerState, reward: &RewardDescriptor, now: u64) -> RewardReceipt {
    let mut levels_gained = 0;
    let applied = match reward.kind {
        RewardKind::Essence => {
            let before = state.ledger.essence;
            let after = state.ledger.credit(Currency::Essence, reward.amount);
            state.stats.essence_earned = state.stats.essence_earned.saturating_add(after - before);
            after - before
        }
        RewardKind::Crystals => {
            let before = state.ledger.crystals;
            state.ledger.credit(Currency::Crystals, reward.amount) - before
        }
        RewardKind::Energy => {
            state.energy.tick(now);
            let amount = u32::try_from(reward.amount).unwrap_or(u32::MAX);
            u64::from(state.energy.grant(amount))
        }
        RewardKind::SeasonXp => {
            let before = state.season.xp;
            levels_gained = state.season.add_xp(reward.amount);
            state.season.xp - before
        }
    };

    debug!(
        kind = ?reward.kind,
        requested = reward.amount,
        applied,
        source = %reward.source,
        "reward applied"
    );

    RewardReceipt {
        kind: reward.kind,
        requested: reward.amount,
        applied,
        source: reward.source.clone(),
        levels_gained,
    }
}
