//! Daily login streak and season pass.

use serde::{Deserialize, Serialize};

use crate::constants::{SEASON_MAX_LEVEL, SEASON_XP_PER_LEVEL, SECONDS_PER_DAY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginOutcome {
    /// First login of a new consecutive day (or the very first login)
    NewDay,
    /// Already logged in today
    AlreadyCounted,
    /// A day was missed; the streak restarted at 1
    Reset,
}

/// Consecutive UTC-day login streak
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStreak {
    pub current: u32,
    pub best: u32,
    /// UTC day index (unix seconds / 86400) of the last counted login
    pub last_login_day: Option<u64>,
}

impl DailyStreak {
    pub fn record_login(&mut self, now: u64) -> LoginOutcome {
        let today = now / SECONDS_PER_DAY;
        let outcome = match self.last_login_day {
            Some(last) if today <= last => return LoginOutcome::AlreadyCounted,
            Some(last) if today == last + 1 => {
                self.current = self.current.saturating_add(1);
                LoginOutcome::NewDay
            }
            Some(_) => {
                self.current = 1;
                LoginOutcome::Reset
            }
            None => {
                self.current = 1;
                LoginOutcome::NewDay
            }
        };
        self.last_login_day = Some(today);
        self.best = self.best.max(self.current);
        outcome
    }

    /// Streak as it stands at `now` (0 once a day has been missed)
    pub fn effective(&self, now: u64) -> u32 {
        match self.last_login_day {
            Some(last) if now / SECONDS_PER_DAY <= last + 1 => self.current,
            _ => 0,
        }
    }
}

/// Season (battle) pass progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonPass {
    pub xp: u64,
}

impl SeasonPass {
    pub fn level(&self) -> u32 {
        let raw = self.xp / SEASON_XP_PER_LEVEL;
        u32::try_from(raw).unwrap_or(u32::MAX).min(SEASON_MAX_LEVEL)
    }

    /// Add XP, returning the number of levels gained
    pub fn add_xp(&mut self, xp: u64) -> u32 {
        let before = self.level();
        self.xp = self.xp.saturating_add(xp);
        self.level() - before
    }

    /// XP still needed for the next level; `None` at max level
    pub fn xp_to_next_level(&self) -> Option<u64> {
        let level = self.level();
        if level >= SEASON_MAX_LEVEL {
            return None;
        }
        Some(u64::from(level + 1) * SEASON_XP_PER_LEVEL - self.xp)
    }
}
