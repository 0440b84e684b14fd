//! Entity generation.
//!
//! Draw order per entity: type, rarity, personality, power jitter, shiny,
//! abilities, id. Keeping it fixed is what makes a seeded run replayable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ability_pool_for, flair_for, Entity, EntityType, Personality, Rarity};
use crate::constants::{
    BASE_TYPE_WEIGHT, FEATURED_TYPE_WEIGHT, SHINY_ODDS, STREAK_POWER_MAX_DAYS, STREAK_POWER_PER_DAY,
    TAG_NUDGE_WEIGHT,
};
use crate::error::{GachaError, GachaResult};
use crate::rng::GachaRng;

/// Caller-provided influences on a summon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationModifiers {
    /// Tags nudging type selection (unknown tags are ignored)
    pub tags: Vec<String>,
    /// Randomness spread: >1 flattens type odds and widens power jitter
    pub temperature: f64,
    /// Flat power added before the weather multiplier
    pub power_boost: f64,
    /// Current daily streak in days
    pub streak: u32,
    /// Seasonal/weather multiplier on power (1.0 = neutral)
    pub weather_bonus: f64,
    /// Banner's featured type, if any
    #[serde(default)]
    pub featured_type: Option<EntityType>,
}

impl Default for GenerationModifiers {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            temperature: 1.0,
            power_boost: 0.0,
            streak: 0,
            weather_bonus: 1.0,
            featured_type: None,
        }
    }
}

impl GenerationModifiers {
    fn effective_temperature(&self) -> f64 {
        if self.temperature.is_finite() {
            self.temperature.clamp(0.1, 10.0)
        } else {
            1.0
        }
    }

    fn effective_weather(&self) -> f64 {
        if self.weather_bonus.is_finite() {
            self.weather_bonus.max(0.0)
        } else {
            1.0
        }
    }

    /// Copy with the given featured type applied
    pub fn featuring(&self, featured_type: Option<EntityType>) -> Self {
        Self {
            featured_type: featured_type.or(self.featured_type),
            ..self.clone()
        }
    }
}

/// Turns rarity weights + modifiers into concrete entities
#[derive(Debug, Clone)]
pub struct EntityGenerator {
    shiny_odds: f64,
}

impl Default for EntityGenerator {
    fn default() -> Self {
        Self {
            shiny_odds: SHINY_ODDS,
        }
    }
}

impl EntityGenerator {
    pub fn new(shiny_odds: f64) -> Self {
        Self { shiny_odds }
    }

    pub fn shiny_odds(&self) -> f64 {
        self.shiny_odds
    }

    /// Generate one entity. `rarity_weights` are expected to be pity-adjusted already.
    pub fn generate(
        &self,
        rarity_weights: &[(Rarity, f64)],
        modifiers: &GenerationModifiers,
        rng: &mut GachaRng,
        now: u64,
    ) -> GachaResult<Entity> {
        let entity_type = rng.draw(&type_weights(modifiers))?;
        let rarity = rng.draw(rarity_weights)?;
        let personality = *rng
            .pick(&Personality::ALL)
            .ok_or_else(|| GachaError::InvalidWeights("empty personality table".into()))?;
        let power = roll_power(rarity, modifiers, rng);
        let shiny = rng.bernoulli(self.shiny_odds);

        let pool = ability_pool_for(rarity);
        let abilities: Vec<String> = rng
            .sample_distinct(&pool, rarity.ability_count())
            .into_iter()
            .map(String::from)
            .collect();
        if abilities.len() != rarity.ability_count() {
            return Err(GachaError::InvalidWeights(format!(
                "ability pool for {} too small",
                rarity.as_str()
            )));
        }

        let id = format!("ent_{:016x}{:016x}", rng.next_u64(), rng.next_u64());
        let flair = flair_for(entity_type, personality);

        debug!(
            id = %id,
            rarity = rarity.as_str(),
            entity_type = entity_type.as_str(),
            power,
            shiny,
            "entity generated"
        );

        Ok(Entity {
            id,
            entity_type,
            rarity,
            personality,
            sigil: flair.sigil,
            aura: flair.aura,
            power,
            domain: flair.domain,
            flavor: flair.flavor,
            shiny,
            abilities,
            created_at: now,
        })
    }
}

/// Type weights shaped by modifier tags and temperature
pub fn type_weights(modifiers: &GenerationModifiers) -> Vec<(EntityType, f64)> {
    let exponent = 1.0 / modifiers.effective_temperature();
    EntityType::ALL
        .iter()
        .map(|t| {
            let matches = modifiers
                .tags
                .iter()
                .filter(|tag| {
                    t.affinity_tags()
                        .iter()
                        .any(|a| a.eq_ignore_ascii_case(tag.as_str()))
                })
                .count();
            let featured = if modifiers.featured_type == Some(*t) {
                FEATURED_TYPE_WEIGHT
            } else {
                0.0
            };
            let raw = BASE_TYPE_WEIGHT + featured + TAG_NUDGE_WEIGHT * matches as f64;
            (*t, raw.powf(exponent))
        })
        .collect()
}

/// Rarity base + jitter + boosts, clamped into the rarity's permitted range
fn roll_power(rarity: Rarity, modifiers: &GenerationModifiers, rng: &mut GachaRng) -> u32 {
    let (min, max) = rarity.power_range();
    let mid = (min + max) as f64 / 2.0;
    let half_width = (max - min) as f64 / 4.0 * modifiers.effective_temperature().min(2.0);
    let jitter = (rng.next_f64() * 2.0 - 1.0) * half_width;

    let streak_bonus = modifiers.streak.min(STREAK_POWER_MAX_DAYS) as f64 * STREAK_POWER_PER_DAY;
    let boost = if modifiers.power_boost.is_finite() {
        modifiers.power_boost
    } else {
        0.0
    };

    let raw = (mid + jitter + boost + streak_bonus) * modifiers.effective_weather();
    let floored = raw.floor().max(0.0);
    (floored as u32).clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BASE_RARITY_WEIGHTS;

    fn only(rarity: Rarity) -> Vec<(Rarity, f64)> {
        Rarity::ALL
            .iter()
            .map(|r| (*r, if *r == rarity { 1.0 } else { 0.0 }))
            .collect()
    }

    #[test]
    fn test_generate_deterministic() {
        let gen = EntityGenerator::default();
        let mods = GenerationModifiers::default();
        let mut a = GachaRng::from_seed(42);
        let mut b = GachaRng::from_seed(42);
        for _ in 0..50 {
            let ea = gen.generate(&BASE_RARITY_WEIGHTS, &mods, &mut a, 1000).unwrap();
            let eb = gen.generate(&BASE_RARITY_WEIGHTS, &mods, &mut b, 1000).unwrap();
            assert_eq!(ea, eb);
        }
    }

    #[test]
    fn test_rarity_bounds_hold_for_every_tier() {
        let gen = EntityGenerator::default();
        let mut rng = GachaRng::from_seed(7);
        let extreme = GenerationModifiers {
            power_boost: 10_000.0,
            streak: 500,
            weather_bonus: 3.0,
            temperature: 9.0,
            ..Default::default()
        };
        let crushed = GenerationModifiers {
            power_boost: -10_000.0,
            weather_bonus: 0.0,
            ..Default::default()
        };
        for rarity in Rarity::ALL {
            for mods in [&GenerationModifiers::default(), &extreme, &crushed] {
                for _ in 0..100 {
                    let e = gen.generate(&only(rarity), mods, &mut rng, 0).unwrap();
                    assert_eq!(e.rarity, rarity);
                    assert!(e.satisfies_rarity_bounds(), "{e:?}");
                }
            }
        }
    }

    #[test]
    fn test_boost_pins_power_to_range_max() {
        let gen = EntityGenerator::default();
        let mut rng = GachaRng::from_seed(3);
        let mods = GenerationModifiers {
            power_boost: 1_000.0,
            ..Default::default()
        };
        let e = gen.generate(&only(Rarity::Rare), &mods, &mut rng, 0).unwrap();
        assert_eq!(e.power, Rarity::Rare.power_range().1);
    }

    #[test]
    fn test_abilities_are_distinct() {
        let gen = EntityGenerator::default();
        let mut rng = GachaRng::from_seed(12);
        for _ in 0..200 {
            let e = gen
                .generate(&only(Rarity::Mythic), &GenerationModifiers::default(), &mut rng, 0)
                .unwrap();
            let mut ids = e.abilities.clone();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), e.abilities.len());
        }
    }

    #[test]
    fn test_tags_nudge_type() {
        let fire = GenerationModifiers {
            tags: vec!["fire".into(), "Chaos".into(), "unknown_tag".into()],
            ..Default::default()
        };
        let weights = type_weights(&fire);
        let demonic = weights
            .iter()
            .find(|(t, _)| *t == EntityType::Demonic)
            .unwrap()
            .1;
        let divine = weights
            .iter()
            .find(|(t, _)| *t == EntityType::Divine)
            .unwrap()
            .1;
        assert!(demonic > divine);
        assert!((demonic - (BASE_TYPE_WEIGHT + 2.0 * TAG_NUDGE_WEIGHT)).abs() < 1e-9);
    }

    #[test]
    fn test_featured_type_boosted() {
        let mods = GenerationModifiers::default().featuring(Some(EntityType::Celestial));
        let weights = type_weights(&mods);
        let celestial = weights
            .iter()
            .find(|(t, _)| *t == EntityType::Celestial)
            .unwrap()
            .1;
        assert!((celestial - (BASE_TYPE_WEIGHT + FEATURED_TYPE_WEIGHT)).abs() < 1e-9);
    }

    #[test]
    fn test_high_temperature_flattens_types() {
        let tagged = GenerationModifiers {
            tags: vec!["sun".into(), "holy".into()],
            ..Default::default()
        };
        let hot = GenerationModifiers {
            temperature: 8.0,
            ..tagged.clone()
        };
        let ratio = |w: &[(EntityType, f64)]| {
            let max = w.iter().map(|(_, v)| *v).fold(f64::MIN, f64::max);
            let min = w.iter().map(|(_, v)| *v).fold(f64::MAX, f64::min);
            max / min
        };
        assert!(ratio(&type_weights(&hot)) < ratio(&type_weights(&tagged)));
    }

    #[test]
    fn test_all_zero_rarity_weights_fail() {
        let gen = EntityGenerator::default();
        let mut rng = GachaRng::from_seed(1);
        let zero: Vec<(Rarity, f64)> = Rarity::ALL.iter().map(|r| (*r, 0.0)).collect();
        let result = gen.generate(&zero, &GenerationModifiers::default(), &mut rng, 0);
        assert!(matches!(result, Err(GachaError::InvalidWeights(_))));
    }

    #[test]
    fn test_shiny_is_rare_but_reachable() {
        let gen = EntityGenerator::new(0.5);
        let mut rng = GachaRng::from_seed(77);
        let shiny = (0..1000)
            .filter(|_| {
                gen.generate(&BASE_RARITY_WEIGHTS, &GenerationModifiers::default(), &mut rng, 0)
                    .unwrap()
                    .shiny
            })
            .count();
        assert!((350..650).contains(&shiny), "shiny count {shiny}");

        let never = EntityGenerator::new(0.0);
        for _ in 0..500 {
            assert!(!never
                .generate(&BASE_RARITY_WEIGHTS, &GenerationModifiers::default(), &mut rng, 0)
                .unwrap()
                .shiny);
        }
    }
}
