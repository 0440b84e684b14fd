//! Currency ledger and entity collection.
//!
//! Balances never go negative: a debit that cannot be covered fails and
//! leaves the ledger untouched. Credits saturate instead of overflowing.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Rarity};
use crate::error::{GachaError, GachaResult};
use crate::events::SacrificeEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// Soft currency (sacrifices, rewards)
    Essence,
    /// Premium currency (pulls)
    Crystals,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Essence => write!(f, "essence"),
            Currency::Crystals => write!(f, "crystals"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub essence: u64,
    pub crystals: u64,
}

impl Ledger {
    pub fn new(essence: u64, crystals: u64) -> Self {
        Self { essence, crystals }
    }

    pub fn balance(&self, currency: Currency) -> u64 {
        match currency {
            Currency::Essence => self.essence,
            Currency::Crystals => self.crystals,
        }
    }

    fn slot(&mut self, currency: Currency) -> &mut u64 {
        match currency {
            Currency::Essence => &mut self.essence,
            Currency::Crystals => &mut self.crystals,
        }
    }

    pub fn can_afford(&self, currency: Currency, amount: u64) -> bool {
        self.balance(currency) >= amount
    }

    /// Apply a signed delta. Returns the new balance.
    pub fn apply_delta(&mut self, currency: Currency, amount: i64) -> GachaResult<u64> {
        let have = self.balance(currency);
        let next = if amount >= 0 {
            have.saturating_add(amount.unsigned_abs())
        } else {
            let need = amount.unsigned_abs();
            have.checked_sub(need).ok_or(GachaError::InsufficientFunds {
                currency,
                have,
                need,
            })?
        };
        *self.slot(currency) = next;
        Ok(next)
    }

    /// Debit an unsigned amount
    pub fn debit(&mut self, currency: Currency, amount: u64) -> GachaResult<u64> {
        let have = self.balance(currency);
        let next = have.checked_sub(amount).ok_or(GachaError::InsufficientFunds {
            currency,
            have,
            need: amount,
        })?;
        *self.slot(currency) = next;
        Ok(next)
    }

    /// Credit an unsigned amount (saturating)
    pub fn credit(&mut self, currency: Currency, amount: u64) -> u64 {
        let slot = self.slot(currency);
        *slot = slot.saturating_add(amount);
        *slot
    }
}

/// Owned entities, in acquisition order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    entities: Vec<Entity>,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Add an entity, failing when the collection already holds `capacity`
    pub fn add_entity(&mut self, entity: Entity, capacity: usize) -> GachaResult<()> {
        if self.entities.len() >= capacity {
            return Err(GachaError::StorageFull { capacity });
        }
        self.entities.push(entity);
        Ok(())
    }

    pub fn remove_entity(&mut self, id: &str) -> GachaResult<Entity> {
        let idx = self
            .entities
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| GachaError::NotFound(id.to_string()))?;
        Ok(self.entities.remove(idx))
    }

    pub fn count_by_rarity(&self) -> BTreeMap<Rarity, usize> {
        let mut counts = BTreeMap::new();
        for entity in &self.entities {
            *counts.entry(entity.rarity).or_insert(0) += 1;
        }
        counts
    }

    pub fn shiny_count(&self) -> usize {
        self.entities.iter().filter(|e| e.shiny).count()
    }
}

/// Essence granted for sacrificing an entity of `power`
pub fn sacrifice_value(power: u32, ratio: f64) -> u64 {
    let ratio = if ratio.is_finite() { ratio.max(0.0) } else { 0.0 };
    (f64::from(power) * ratio).floor() as u64
}

/// Destroy an owned entity and credit its essence value
pub fn sacrifice(
    ledger: &mut Ledger,
    collection: &mut Collection,
    id: &str,
    ratio: f64,
    now: u64,
) -> GachaResult<SacrificeEvent> {
    let entity = collection.remove_entity(id)?;
    let essence = sacrifice_value(entity.power, ratio);
    ledger.apply_delta(Currency::Essence, i64::try_from(essence).unwrap_or(i64::MAX))?;
    Ok(SacrificeEvent {
        entity,
        essence_granted: essence,
        timestamp: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityType, Personality};

    fn entity(id: &str, rarity: Rarity, power: u32) -> Entity {
        Entity {
            id: id.into(),
            entity_type: EntityType::Spectral,
            rarity,
            personality: Personality::Loyal,
            sigil: "hollow_eye".into(),
            aura: "steadfast".into(),
            power,
            domain: "Veil".into(),
            flavor: String::new(),
            shiny: false,
            abilities: vec![],
            created_at: 0,
        }
    }

    #[test]
    fn test_failed_debit_leaves_balance() {
        let mut ledger = Ledger::new(0, 40);
        let err = ledger.apply_delta(Currency::Crystals, -50).unwrap_err();
        assert_eq!(
            err,
            GachaError::InsufficientFunds {
                currency: Currency::Crystals,
                have: 40,
                need: 50
            }
        );
        assert_eq!(ledger.crystals, 40);
    }

    #[test]
    fn test_credit_saturates() {
        let mut ledger = Ledger::new(u64::MAX - 1, 0);
        assert_eq!(ledger.apply_delta(Currency::Essence, 10).unwrap(), u64::MAX);
    }

    #[test]
    fn test_exact_debit_reaches_zero() {
        let mut ledger = Ledger::new(0, 50);
        assert_eq!(ledger.debit(Currency::Crystals, 50).unwrap(), 0);
        assert!(!ledger.can_afford(Currency::Crystals, 1));
    }

    #[test]
    fn test_capacity_enforced() {
        let mut collection = Collection::default();
        collection.add_entity(entity("a", Rarity::Common, 10), 2).unwrap();
        collection.add_entity(entity("b", Rarity::Common, 10), 2).unwrap();
        let err = collection
            .add_entity(entity("c", Rarity::Common, 10), 2)
            .unwrap_err();
        assert_eq!(err, GachaError::StorageFull { capacity: 2 });
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let mut collection = Collection::default();
        assert!(matches!(
            collection.remove_entity("nope"),
            Err(GachaError::NotFound(_))
        ));
    }

    #[test]
    fn test_sacrifice_credits_floor_of_ratio() {
        let mut ledger = Ledger::default();
        let mut collection = Collection::default();
        collection.add_entity(entity("x", Rarity::Rare, 55), 10).unwrap();

        let event = sacrifice(&mut ledger, &mut collection, "x", 0.75, 99).unwrap();
        assert_eq!(event.essence_granted, 41);
        assert_eq!(event.entity.id, "x");
        assert_eq!(ledger.essence, 41);
        assert!(collection.is_empty());

        assert!(sacrifice(&mut ledger, &mut collection, "x", 0.75, 99).is_err());
        assert_eq!(ledger.essence, 41);
    }

    #[test]
    fn test_sacrifice_essence_saturates() {
        let mut ledger = Ledger::new(u64::MAX - 10, 0);
        let mut collection = Collection::default();
        collection.add_entity(entity("x", Rarity::Rare, 55), 10).unwrap();

        let event = sacrifice(&mut ledger, &mut collection, "x", 0.75, 1).unwrap();
        assert_eq!(event.essence_granted, 41);
        assert_eq!(ledger.essence, u64::MAX);
        assert!(collection.is_empty());
    }

    #[test]
    fn test_count_by_rarity() {
        let mut collection = Collection::default();
        collection.add_entity(entity("a", Rarity::Common, 10), 10).unwrap();
        collection.add_entity(entity("b", Rarity::Common, 12), 10).unwrap();
        collection.add_entity(entity("c", Rarity::Mythic, 200), 10).unwrap();
        let counts = collection.count_by_rarity();
        assert_eq!(counts.get(&Rarity::Common), Some(&2));
        assert_eq!(counts.get(&Rarity::Mythic), Some(&1));
        assert_eq!(counts.get(&Rarity::Rare), None);
    }
}
