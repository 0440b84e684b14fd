//! Energy regeneration clock.
//!
//! Energy is computed lazily: nothing runs on a timer, callers `tick` with
//! the current time before reading or spending. Partial progress towards the
//! next point is kept by advancing `last_update` only by whole regen periods.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ENERGY_REGEN_SECS, DEFAULT_MAX_ENERGY};
use crate::error::{GachaError, GachaResult};

/// Energy tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyConfig {
    pub max: u32,
    /// Seconds per regenerated point
    pub regen_secs: u64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max: DEFAULT_MAX_ENERGY,
            regen_secs: DEFAULT_ENERGY_REGEN_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyState {
    pub current: u32,
    pub max: u32,
    pub regen_secs: u64,
    pub last_update: u64,
}

impl EnergyState {
    /// Full energy as of `now`
    pub fn full(config: &EnergyConfig, now: u64) -> Self {
        Self {
            current: config.max,
            max: config.max,
            regen_secs: config.regen_secs,
            last_update: now,
        }
    }

    /// Credit whole regen periods elapsed since `last_update`.
    /// Returns the number of points actually gained.
    pub fn tick(&mut self, now: u64) -> u32 {
        if now <= self.last_update || self.regen_secs == 0 {
            return 0;
        }
        let elapsed = now - self.last_update;
        let regenerated = elapsed / self.regen_secs;
        if regenerated == 0 {
            return 0;
        }

        let before = self.current;
        let gained = u32::try_from(regenerated).unwrap_or(u32::MAX);
        self.current = self.current.saturating_add(gained).min(self.max);
        self.last_update += regenerated * self.regen_secs;
        self.current - before
    }

    /// Copy ticked to `now`
    pub fn at(&self, now: u64) -> Self {
        let mut view = self.clone();
        view.tick(now);
        view
    }

    /// Spend `amount` points. `last_update` is left untouched.
    pub fn spend(&mut self, amount: u32) -> GachaResult<()> {
        if self.current < amount {
            return Err(GachaError::InsufficientEnergy {
                have: self.current,
                need: amount,
            });
        }
        self.current -= amount;
        Ok(())
    }

    /// Add points from a reward, capped at max. Returns points actually added.
    pub fn grant(&mut self, amount: u32) -> u32 {
        let before = self.current;
        self.current = self.current.saturating_add(amount).min(self.max);
        self.current - before
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Seconds until the next point regenerates; `None` when full
    pub fn seconds_until_next(&self, now: u64) -> Option<u64> {
        let view = self.at(now);
        if view.is_full() || view.regen_secs == 0 {
            return None;
        }
        let carried = now.saturating_sub(view.last_update);
        Some(view.regen_secs - carried % view.regen_secs)
    }

    /// Seconds until energy is full; 0 when already full
    pub fn seconds_until_full(&self, now: u64) -> u64 {
        let view = self.at(now);
        match view.seconds_until_next(now) {
            None => 0,
            Some(next) => {
                let missing = u64::from(view.max - view.current);
                next + (missing - 1) * view.regen_secs
            }
        }
    }
}
