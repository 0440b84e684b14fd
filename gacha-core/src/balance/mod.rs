//! Monte-Carlo pity balance check.
//!
//! Simulates many independent players pulling on a rarity table and reports
//! observed rates and gaps, including whether the pity caps held. Uses rayon
//! for parallel execution across CPU cores; each simulated player gets its
//! own seed so the run is deterministic regardless of thread count.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::entity::Rarity;
use crate::error::GachaResult;
use crate::pity::{adjust_weights, PityConfig, PullState};
use crate::rng::{derive_seed, GachaRng};

/// Configuration for a simulation run
#[derive(Debug, Clone)]
pub struct PitySimConfig {
    pub players: u64,
    pub pulls_per_player: u32,
    pub base_seed: u64,
}

impl Default for PitySimConfig {
    fn default() -> Self {
        Self {
            players: 2_000,
            pulls_per_player: 500,
            base_seed: 42,
        }
    }
}

/// Per-player tallies, merged into a [`PityReport`]
#[derive(Debug, Clone, Copy, Default)]
struct PlayerRun {
    pulls: u64,
    legendary_tier: u64,
    mythic: u64,
    gap_sum: u64,
    gap_count: u64,
    max_legendary_gap: u32,
    max_mythic_gap: u32,
    max_legendaries_between_mythics: u32,
}

impl PlayerRun {
    fn merge(self, other: Self) -> Self {
        Self {
            pulls: self.pulls + other.pulls,
            legendary_tier: self.legendary_tier + other.legendary_tier,
            mythic: self.mythic + other.mythic,
            gap_sum: self.gap_sum + other.gap_sum,
            gap_count: self.gap_count + other.gap_count,
            max_legendary_gap: self.max_legendary_gap.max(other.max_legendary_gap),
            max_mythic_gap: self.max_mythic_gap.max(other.max_mythic_gap),
            max_legendaries_between_mythics: self
                .max_legendaries_between_mythics
                .max(other.max_legendaries_between_mythics),
        }
    }
}

/// Results of a pity simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PityReport {
    pub players: u64,
    pub total_pulls: u64,
    /// Share of pulls that were legendary or mythic
    pub legendary_rate: f64,
    pub mythic_rate: f64,
    /// Mean pulls between legendary-tier results
    pub mean_legendary_gap: f64,
    pub max_legendary_gap: u32,
    pub max_mythic_gap: u32,
    /// No player went more than `hard_cap` pulls without a legendary-tier result
    pub hard_cap_held: bool,
    /// No player saw more than `mythic_guarantee_cap` legendary-tier results without a mythic
    pub mythic_guarantee_held: bool,
}

impl PityReport {
    /// Hex SHA3-256 fingerprint of the report
    pub fn hash(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha3_256::new();
        hasher.update(&bytes);
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

fn player_seed(base_seed: u64, index: u64) -> u64 {
    derive_seed(base_seed, &[&index.to_le_bytes()])
}

fn simulate_player(
    table: &[(Rarity, f64)],
    pity: &PityConfig,
    pulls: u32,
    seed: u64,
) -> GachaResult<PlayerRun> {
    let mut rng = GachaRng::from_seed(seed);
    let mut state = PullState::default();
    let mut run = PlayerRun::default();

    for _ in 0..pulls {
        let weights = adjust_weights(table, &state, pity);
        let rarity = rng.draw(&weights)?;
        let legendary_gap = state.pity_counter + 1;
        let mythic_gap = state.guarantee_counter + 1;

        state.record(rarity, "sim");
        run.pulls += 1;

        if rarity.is_legendary_tier() {
            run.legendary_tier += 1;
            run.gap_sum += u64::from(legendary_gap);
            run.gap_count += 1;
            run.max_legendary_gap = run.max_legendary_gap.max(legendary_gap);
        }
        if rarity == Rarity::Mythic {
            run.mythic += 1;
            run.max_mythic_gap = run.max_mythic_gap.max(mythic_gap);
        }
        run.max_legendaries_between_mythics = run
            .max_legendaries_between_mythics
            .max(state.legendaries_since_mythic);
    }

    // Trailing pulls without a hit still count towards the observed gaps
    run.max_legendary_gap = run.max_legendary_gap.max(state.pity_counter);
    run.max_mythic_gap = run.max_mythic_gap.max(state.guarantee_counter);
    Ok(run)
}

/// Run the Monte-Carlo pity simulation with rayon parallelism
pub fn simulate_pity(
    table: &[(Rarity, f64)],
    pity: &PityConfig,
    sim: &PitySimConfig,
) -> GachaResult<PityReport> {
    let runs: Vec<PlayerRun> = (0..sim.players)
        .into_par_iter()
        .map(|i| {
            simulate_player(
                table,
                pity,
                sim.pulls_per_player,
                player_seed(sim.base_seed, i),
            )
        })
        .collect::<GachaResult<_>>()?;

    let total = runs
        .into_iter()
        .fold(PlayerRun::default(), PlayerRun::merge);

    let rate = |n: u64| {
        if total.pulls == 0 {
            0.0
        } else {
            n as f64 / total.pulls as f64
        }
    };

    Ok(PityReport {
        players: sim.players,
        total_pulls: total.pulls,
        legendary_rate: rate(total.legendary_tier),
        mythic_rate: rate(total.mythic),
        mean_legendary_gap: if total.gap_count == 0 {
            0.0
        } else {
            total.gap_sum as f64 / total.gap_count as f64
        },
        max_legendary_gap: total.max_legendary_gap,
        max_mythic_gap: total.max_mythic_gap,
        hard_cap_held: total.max_legendary_gap <= pity.hard_cap,
        mythic_guarantee_held: total.max_legendaries_between_mythics < pity.mythic_guarantee_cap,
    })
}
