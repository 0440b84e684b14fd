//! Pity / guarantee tracking.
//!
//! Three counters bias the rarity table:
//! - `pity_counter`: pulls since the last legendary-or-above. Ramps
//!   legendary/mythic odds past the soft threshold and forces a
//!   legendary-tier result at the hard cap.
//! - `legendaries_since_mythic`: legendary-tier pulls since the last mythic.
//!   When it reaches the guarantee cap the next legendary-tier pull is mythic.
//! - `guarantee_counter`: pulls since the last mythic. Only consulted when an
//!   optional mythic hard cap is configured.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    MYTHIC_GUARANTEE_CAP, PITY_HARD_CAP, PITY_SOFT_RAMP, PITY_SOFT_THRESHOLD,
};
use crate::entity::Rarity;

/// Pity tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PityConfig {
    pub soft_threshold: u32,
    pub hard_cap: u32,
    pub soft_ramp: f64,
    pub mythic_guarantee_cap: u32,
    /// Pulls without a mythic after which the next pull is forced mythic
    #[serde(default)]
    pub mythic_hard_cap: Option<u32>,
}

impl Default for PityConfig {
    fn default() -> Self {
        Self {
            soft_threshold: PITY_SOFT_THRESHOLD,
            hard_cap: PITY_HARD_CAP,
            soft_ramp: PITY_SOFT_RAMP,
            mythic_guarantee_cap: MYTHIC_GUARANTEE_CAP,
            mythic_hard_cap: None,
        }
    }
}

impl PityConfig {
    /// Describe the first problem with this config, if any
    pub fn problem(&self) -> Option<String> {
        if self.hard_cap == 0 {
            return Some("pity hard_cap must be at least 1".into());
        }
        if self.soft_threshold >= self.hard_cap {
            return Some(format!(
                "pity soft_threshold ({}) must be below hard_cap ({})",
                self.soft_threshold, self.hard_cap
            ));
        }
        if !self.soft_ramp.is_finite() || self.soft_ramp < 0.0 {
            return Some("pity soft_ramp must be finite and non-negative".into());
        }
        if self.mythic_guarantee_cap == 0 {
            return Some("mythic_guarantee_cap must be at least 1".into());
        }
        if self.mythic_hard_cap == Some(0) {
            return Some("mythic_hard_cap must be at least 1 when set".into());
        }
        None
    }

    /// Multiplier applied to legendary/mythic weights at the given pity
    pub fn soft_multiplier(&self, pity: u32) -> f64 {
        if pity < self.soft_threshold {
            1.0
        } else {
            1.0 + self.soft_ramp * (pity - self.soft_threshold + 1) as f64
        }
    }
}

/// Per-user pity counters (shared across banners)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullState {
    pub pity_counter: u32,
    pub guarantee_counter: u32,
    pub legendaries_since_mythic: u32,
    /// banner id -> cumulative pulls
    #[serde(default)]
    pub banner_pulls: BTreeMap<String, u64>,
}

impl PullState {
    /// The next pull must be legendary-or-above
    pub fn hard_pity_active(&self, config: &PityConfig) -> bool {
        self.pity_counter.saturating_add(1) >= config.hard_cap
    }

    /// The next legendary-tier pull will be upgraded to mythic
    pub fn mythic_guarantee_active(&self, config: &PityConfig) -> bool {
        self.legendaries_since_mythic.saturating_add(1) >= config.mythic_guarantee_cap
    }

    pub fn pulls_on(&self, banner_id: &str) -> u64 {
        self.banner_pulls.get(banner_id).copied().unwrap_or(0)
    }

    /// Apply a pull result in place
    pub fn record(&mut self, rarity: Rarity, banner_id: &str) {
        if rarity.is_legendary_tier() {
            self.pity_counter = 0;
        } else {
            self.pity_counter = self.pity_counter.saturating_add(1);
        }

        match rarity {
            Rarity::Mythic => {
                self.guarantee_counter = 0;
                self.legendaries_since_mythic = 0;
            }
            Rarity::Legendary => {
                self.guarantee_counter = self.guarantee_counter.saturating_add(1);
                self.legendaries_since_mythic = self.legendaries_since_mythic.saturating_add(1);
            }
            Rarity::Common | Rarity::Rare => {
                self.guarantee_counter = self.guarantee_counter.saturating_add(1);
            }
        }

        *self.banner_pulls.entry(banner_id.to_string()).or_insert(0) += 1;
    }
}

/// Bias `base` by the current counters. Never mutates the state.
pub fn adjust_weights(
    base: &[(Rarity, f64)],
    state: &PullState,
    config: &PityConfig,
) -> Vec<(Rarity, f64)> {
    let mut weights = base.to_vec();

    let multiplier = config.soft_multiplier(state.pity_counter);
    if multiplier > 1.0 {
        for (rarity, weight) in weights.iter_mut() {
            if rarity.is_legendary_tier() {
                *weight *= multiplier;
            }
        }
    }

    if state.hard_pity_active(config) {
        for (rarity, weight) in weights.iter_mut() {
            if !rarity.is_legendary_tier() {
                *weight = 0.0;
            }
        }
    }

    if state.mythic_guarantee_active(config) {
        let folded: f64 = weights
            .iter()
            .filter(|(r, _)| *r == Rarity::Legendary)
            .map(|(_, w)| *w)
            .sum();
        for (rarity, weight) in weights.iter_mut() {
            match rarity {
                Rarity::Legendary => *weight = 0.0,
                Rarity::Mythic => *weight += folded,
                _ => {}
            }
        }
    }

    if let Some(cap) = config.mythic_hard_cap {
        if state.guarantee_counter.saturating_add(1) >= cap {
            for (rarity, weight) in weights.iter_mut() {
                if *rarity == Rarity::Mythic {
                    if *weight <= 0.0 {
                        *weight = 1.0;
                    }
                } else {
                    *weight = 0.0;
                }
            }
        }
    }

    weights
}

/// Pure form of [`PullState::record`]
pub fn record_outcome(state: &PullState, rarity: Rarity, banner_id: &str) -> PullState {
    let mut next = state.clone();
    next.record(rarity, banner_id);
    next
}
