//! Domain events for external reward/quest/achievement hooks.
//!
//! The engine only produces events; delivery is up to an [`EventSink`]
//! supplied by the host.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Rarity};
use crate::progression::LoginOutcome;
use crate::rewards::RewardReceipt;

/// One generated unit of a pull
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullEvent {
    pub entity: Entity,
    pub rarity: Rarity,
    pub is_shiny: bool,
    pub banner_id: String,
    pub timestamp: u64,
}

impl PullEvent {
    pub fn new(entity: Entity, banner_id: &str, timestamp: u64) -> Self {
        Self {
            rarity: entity.rarity,
            is_shiny: entity.shiny,
            banner_id: banner_id.to_string(),
            entity,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SacrificeEvent {
    pub entity: Entity,
    pub essence_granted: u64,
    pub timestamp: u64,
}

/// Everything a hook can observe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GachaEvent {
    Pull(PullEvent),
    Sacrifice(SacrificeEvent),
    Reward(RewardReceipt),
    Login { outcome: LoginOutcome, streak: u32 },
}

impl GachaEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            GachaEvent::Pull(_) => "pull",
            GachaEvent::Sacrifice(_) => "sacrifice",
            GachaEvent::Reward(_) => "reward",
            GachaEvent::Login { .. } => "login",
        }
    }
}

/// Receives events after a mutation has been committed
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &GachaEvent);

    fn emit_all(&self, events: &[GachaEvent]) {
        for event in events {
            self.emit(event);
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &GachaEvent) {}
}

/// Buffers events in memory (tests, replay)
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<GachaEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything recorded so far
    pub fn drain(&self) -> Vec<GachaEvent> {
        match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: &GachaEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
