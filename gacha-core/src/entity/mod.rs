//! Collectible entities and their static lookup tables.
//!
//! An entity is immutable once generated. Rarity gates its power range and
//! ability count; type and personality drive the cosmetic lookups.

use serde::{Deserialize, Serialize};

pub mod generator;

pub use generator::{EntityGenerator, GenerationModifiers};

/// Rarity ladder (ordered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Legendary,
    Mythic,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::Legendary,
        Rarity::Mythic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Legendary => "legendary",
            Rarity::Mythic => "mythic",
        }
    }

    /// Inclusive power range permitted for this rarity
    pub fn power_range(&self) -> (u32, u32) {
        match self {
            Rarity::Common => (10, 30),
            Rarity::Rare => (40, 70),
            Rarity::Legendary => (90, 140),
            Rarity::Mythic => (180, 260),
        }
    }

    /// Number of abilities an entity of this rarity carries
    pub fn ability_count(&self) -> usize {
        match self {
            Rarity::Common => 1,
            Rarity::Rare => 2,
            Rarity::Legendary => 3,
            Rarity::Mythic => 4,
        }
    }

    /// Legendary or above (resets the pity counter)
    pub fn is_legendary_tier(&self) -> bool {
        *self >= Rarity::Legendary
    }
}

/// Entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Demonic,
    Divine,
    Ancient,
    Elemental,
    Spectral,
    Celestial,
}

impl EntityType {
    pub const ALL: [EntityType; 6] = [
        EntityType::Demonic,
        EntityType::Divine,
        EntityType::Ancient,
        EntityType::Elemental,
        EntityType::Spectral,
        EntityType::Celestial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Demonic => "demonic",
            EntityType::Divine => "divine",
            EntityType::Ancient => "ancient",
            EntityType::Elemental => "elemental",
            EntityType::Spectral => "spectral",
            EntityType::Celestial => "celestial",
        }
    }

    /// Modifier tags that nudge this type upward
    pub fn affinity_tags(&self) -> &'static [&'static str] {
        match self {
            EntityType::Demonic => &["fire", "chaos", "blood", "infernal"],
            EntityType::Divine => &["light", "holy", "sun", "dawn"],
            EntityType::Ancient => &["stone", "ruin", "old", "earth"],
            EntityType::Elemental => &["storm", "ocean", "wind", "rain"],
            EntityType::Spectral => &["night", "ghost", "moon", "mist"],
            EntityType::Celestial => &["star", "sky", "cosmos", "eclipse"],
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            EntityType::Demonic => "demon",
            EntityType::Divine => "seraph",
            EntityType::Ancient => "colossus",
            EntityType::Elemental => "elemental",
            EntityType::Spectral => "wraith",
            EntityType::Celestial => "starborn",
        }
    }

    pub fn domain(&self) -> &'static str {
        match self {
            EntityType::Demonic => "Abyss",
            EntityType::Divine => "Sanctum",
            EntityType::Ancient => "Ruins",
            EntityType::Elemental => "Wilds",
            EntityType::Spectral => "Veil",
            EntityType::Celestial => "Firmament",
        }
    }

    pub fn sigil(&self) -> &'static str {
        match self {
            EntityType::Demonic => "horned_pentacle",
            EntityType::Divine => "radiant_halo",
            EntityType::Ancient => "weathered_glyph",
            EntityType::Elemental => "storm_rune",
            EntityType::Spectral => "hollow_eye",
            EntityType::Celestial => "star_compass",
        }
    }
}

/// Personality tag (the only random cosmetic input)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Fierce,
    Serene,
    Mischievous,
    Loyal,
    Cunning,
    Melancholic,
}

impl Personality {
    pub const ALL: [Personality; 6] = [
        Personality::Fierce,
        Personality::Serene,
        Personality::Mischievous,
        Personality::Loyal,
        Personality::Cunning,
        Personality::Melancholic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Fierce => "fierce",
            Personality::Serene => "serene",
            Personality::Mischievous => "mischievous",
            Personality::Loyal => "loyal",
            Personality::Cunning => "cunning",
            Personality::Melancholic => "melancholic",
        }
    }

    pub fn aura(&self) -> &'static str {
        match self {
            Personality::Fierce => "blazing",
            Personality::Serene => "tranquil",
            Personality::Mischievous => "flickering",
            Personality::Loyal => "steadfast",
            Personality::Cunning => "shrouded",
            Personality::Melancholic => "drifting",
        }
    }
}

/// Cosmetic fields derived from type + personality (no randomness)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flair {
    pub sigil: String,
    pub aura: String,
    pub domain: String,
    pub flavor: String,
}

pub fn flair_for(entity_type: EntityType, personality: Personality) -> Flair {
    let aura = personality.aura();
    let domain = entity_type.domain();
    Flair {
        sigil: entity_type.sigil().to_string(),
        aura: aura.to_string(),
        domain: domain.to_string(),
        flavor: format!(
            "A {} {} of the {}, wreathed in a {} aura.",
            personality.as_str(),
            entity_type.noun(),
            domain,
            aura
        ),
    }
}

/// Ability definition gated by minimum rarity
#[derive(Debug, Clone, Copy)]
pub struct AbilityDef {
    pub id: &'static str,
    pub min_rarity: Rarity,
}

pub const ABILITY_POOL: [AbilityDef; 15] = [
    AbilityDef { id: "ember_strike", min_rarity: Rarity::Common },
    AbilityDef { id: "stone_skin", min_rarity: Rarity::Common },
    AbilityDef { id: "gust_step", min_rarity: Rarity::Common },
    AbilityDef { id: "shade_veil", min_rarity: Rarity::Common },
    AbilityDef { id: "minor_mend", min_rarity: Rarity::Common },
    AbilityDef { id: "war_cry", min_rarity: Rarity::Common },
    AbilityDef { id: "soul_siphon", min_rarity: Rarity::Rare },
    AbilityDef { id: "tidal_lash", min_rarity: Rarity::Rare },
    AbilityDef { id: "runic_ward", min_rarity: Rarity::Rare },
    AbilityDef { id: "phantom_echo", min_rarity: Rarity::Rare },
    AbilityDef { id: "judgement_ray", min_rarity: Rarity::Legendary },
    AbilityDef { id: "abyssal_pact", min_rarity: Rarity::Legendary },
    AbilityDef { id: "time_fracture", min_rarity: Rarity::Legendary },
    AbilityDef { id: "starfall", min_rarity: Rarity::Mythic },
    AbilityDef { id: "genesis_flame", min_rarity: Rarity::Mythic },
];

/// Ability ids available to an entity of `rarity`
pub fn ability_pool_for(rarity: Rarity) -> Vec<&'static str> {
    ABILITY_POOL
        .iter()
        .filter(|a| a.min_rarity <= rarity)
        .map(|a| a.id)
        .collect()
}

/// A generated collectible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub entity_type: EntityType,
    pub rarity: Rarity,
    pub personality: Personality,
    pub sigil: String,
    pub aura: String,
    pub power: u32,
    pub domain: String,
    pub flavor: String,
    pub shiny: bool,
    pub abilities: Vec<String>,
    pub created_at: u64,
}

impl Entity {
    /// Check the rarity-gated invariants (power range, ability count)
    pub fn satisfies_rarity_bounds(&self) -> bool {
        let (min, max) = self.rarity.power_range();
        (min..=max).contains(&self.power) && self.abilities.len() == self.rarity.ability_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rarity_ordering() {
        assert!(Rarity::Common < Rarity::Rare);
        assert!(Rarity::Rare < Rarity::Legendary);
        assert!(Rarity::Legendary < Rarity::Mythic);
        assert!(Rarity::Mythic.is_legendary_tier());
        assert!(!Rarity::Rare.is_legendary_tier());
    }

    #[test]
    fn test_power_ranges_do_not_overlap() {
        for pair in Rarity::ALL.windows(2) {
            let (_, lower_max) = pair[0].power_range();
            let (upper_min, _) = pair[1].power_range();
            assert!(lower_max < upper_min, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_ability_count_strictly_increases() {
        for pair in Rarity::ALL.windows(2) {
            assert!(pair[0].ability_count() < pair[1].ability_count());
        }
    }

    #[test]
    fn test_ability_pool_covers_count() {
        for rarity in Rarity::ALL {
            assert!(ability_pool_for(rarity).len() >= rarity.ability_count());
        }
        assert_eq!(ability_pool_for(Rarity::Common).len(), 6);
        assert_eq!(ability_pool_for(Rarity::Mythic).len(), ABILITY_POOL.len());
    }

    #[test]
    fn test_flair_is_deterministic() {
        let a = flair_for(EntityType::Demonic, Personality::Fierce);
        let b = flair_for(EntityType::Demonic, Personality::Fierce);
        assert_eq!(a, b);
        assert_eq!(a.domain, "Abyss");
        assert_eq!(a.aura, "blazing");
        assert!(a.flavor.contains("demon"));
    }

    #[test]
    fn test_rarity_serializes_snake_case() {
        let json = serde_json::to_string(&Rarity::Legendary).unwrap();
        assert_eq!(json, "\"legendary\"");
    }
}
