//! Pull orchestration.
//!
//! A pull runs Validate -> Charge -> GenerateLoop -> Commit against working
//! copies of the ledger, energy and pity counters. Nothing reaches the
//! caller's [`PlayerState`] unless every generated unit succeeded. Running
//! out of inventory space during commit is reported as a partial-storage
//! outcome: the charge and the consumed pity stand, and the entities that
//! did not fit are returned as overflow.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::{
    BASE_RARITY_WEIGHTS, MULTI_PULL_COST_CRYSTALS, MULTI_PULL_SIZE, PULL_COST_CRYSTALS,
    PULL_ENERGY_COST,
};
use crate::entity::{Entity, EntityGenerator, EntityType, GenerationModifiers, Rarity};
use crate::error::{GachaError, GachaResult};
use crate::events::PullEvent;
use crate::ledger::Currency;
use crate::logging::TimingSpan;
use crate::pity::{adjust_weights, PityConfig, PullState};
use crate::rng::GachaRng;
use crate::state::PlayerState;
use crate::tier::AccountTier;

/// A summon banner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub id: String,
    pub name: String,
    /// Replaces the base rarity ladder for this banner
    #[serde(default)]
    pub rarity_weights: Option<Vec<(Rarity, f64)>>,
    #[serde(default)]
    pub featured_type: Option<EntityType>,
    /// Extra modifier tags applied to every pull on this banner
    #[serde(default)]
    pub tags: Vec<String>,
    pub crystal_cost: u64,
    pub energy_cost: u32,
    /// Pulls per discounted bundle (0 disables bundles)
    pub bundle_size: u32,
    pub bundle_cost: u64,
}

impl Banner {
    pub fn standard() -> Self {
        Self {
            id: "standard".into(),
            name: "Standard Summon".into(),
            rarity_weights: None,
            featured_type: None,
            tags: Vec::new(),
            crystal_cost: PULL_COST_CRYSTALS,
            energy_cost: PULL_ENERGY_COST,
            bundle_size: MULTI_PULL_SIZE,
            bundle_cost: MULTI_PULL_COST_CRYSTALS,
        }
    }

    pub fn rarity_table(&self) -> &[(Rarity, f64)] {
        match &self.rarity_weights {
            Some(table) => table,
            None => &BASE_RARITY_WEIGHTS,
        }
    }

    /// Crystal cost of `count` pulls: each full bundle at the bundle price,
    /// the remainder at the single-pull price
    pub fn cost_for(&self, count: u32) -> u64 {
        let (bundles, singles) = if self.bundle_size == 0 {
            (0, count)
        } else {
            (count / self.bundle_size, count % self.bundle_size)
        };
        u64::from(bundles)
            .saturating_mul(self.bundle_cost)
            .saturating_add(u64::from(singles).saturating_mul(self.crystal_cost))
    }

    pub fn energy_for(&self, count: u32) -> u32 {
        self.energy_cost.saturating_mul(count)
    }
}

/// Per-request inputs that are not part of the player's state
#[derive(Debug, Clone, Copy)]
pub struct PullContext<'a> {
    pub tier: &'a AccountTier,
    pub pity: &'a PityConfig,
    pub generator: &'a EntityGenerator,
    pub modifiers: &'a GenerationModifiers,
    pub now: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullStatus {
    Complete,
    /// Inventory filled mid-commit; see `overflow`
    PartialStorage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullOutcome {
    /// Every generated entity, in pull order
    pub entities: Vec<Entity>,
    /// How many of `entities` made it into the collection
    pub stored: usize,
    /// Generated but not stored
    pub overflow: Vec<Entity>,
    pub events: Vec<PullEvent>,
    pub status: PullStatus,
    pub pull_state: PullState,
    pub crystals_spent: u64,
    pub energy_spent: u32,
}

impl PullOutcome {
    pub fn best_rarity(&self) -> Option<Rarity> {
        self.entities.iter().map(|e| e.rarity).max()
    }
}

/// Perform `count` pulls on `banner` for `state`.
///
/// On error `state` is unchanged.
pub fn perform_pull(
    state: &mut PlayerState,
    banner: &Banner,
    count: u32,
    ctx: &PullContext<'_>,
    rng: &mut GachaRng,
) -> GachaResult<PullOutcome> {
    let _span = TimingSpan::new("perform_pull");

    // Validate
    let max = ctx.tier.max_pulls_per_request;
    if count == 0 || count > max {
        return Err(GachaError::InvalidPullCount {
            requested: count,
            max,
        });
    }

    // Charge (working copies)
    let crystals_spent = banner.cost_for(count);
    let energy_spent = banner.energy_for(count);
    let mut ledger = state.ledger.clone();
    let mut energy = state.energy.clone();
    energy.tick(ctx.now);
    ledger.debit(Currency::Crystals, crystals_spent)?;
    energy.spend(energy_spent)?;

    // GenerateLoop
    let mut modifiers = GenerationModifiers {
        streak: ctx.modifiers.streak.max(state.streak.effective(ctx.now)),
        ..ctx.modifiers.featuring(banner.featured_type)
    };
    modifiers.tags.extend(banner.tags.iter().cloned());

    let mut pulls = state.pulls.clone();
    let mut batch = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let weights = adjust_weights(banner.rarity_table(), &pulls, ctx.pity);
        let entity = ctx.generator.generate(&weights, &modifiers, rng, ctx.now)?;
        pulls.record(entity.rarity, &banner.id);
        batch.push(entity);
    }

    // Commit
    state.ledger = ledger;
    state.energy = energy;
    state.pulls = pulls;

    let capacity = ctx.tier.inventory_capacity;
    let mut stored = 0;
    let mut overflow = Vec::new();
    for entity in &batch {
        if state.collection.len() < capacity {
            state.collection.add_entity(entity.clone(), capacity)?;
            stored += 1;
        } else {
            overflow.push(entity.clone());
        }
    }

    let shiny = batch.iter().filter(|e| e.shiny).count() as u64;
    state.stats.total_pulls = state.stats.total_pulls.saturating_add(u64::from(count));
    state.stats.shiny_pulls = state.stats.shiny_pulls.saturating_add(shiny);

    let events: Vec<PullEvent> = batch
        .iter()
        .map(|e| PullEvent::new(e.clone(), &banner.id, ctx.now))
        .collect();

    let status = if overflow.is_empty() {
        PullStatus::Complete
    } else {
        warn!(
            banner = %banner.id,
            stored,
            overflow = overflow.len(),
            capacity,
            "inventory full, pull partially stored"
        );
        PullStatus::PartialStorage
    };

    let outcome = PullOutcome {
        entities: batch,
        stored,
        overflow,
        events,
        status,
        pull_state: state.pulls.clone(),
        crystals_spent,
        energy_spent,
    };

    info!(
        banner = %banner.id,
        count,
        crystals_spent,
        best = outcome.best_rarity().map(|r| r.as_str()).unwrap_or("none"),
        pity = state.pulls.pity_counter,
        "pull committed"
    );

    Ok(outcome)
}
