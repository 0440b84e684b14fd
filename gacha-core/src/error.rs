//! Domain error taxonomy.
//!
//! `InvalidWeights` is a configuration defect and is never shown to players.
//! Every other variant is recoverable and surfaced verbatim to the caller.

use serde::{Deserialize, Serialize};

use crate::ledger::Currency;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum GachaError {
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
    #[error("Insufficient {currency}: have {have}, need {need}")]
    InsufficientFunds {
        currency: Currency,
        have: u64,
        need: u64,
    },
    #[error("Insufficient energy: have {have}, need {need}")]
    InsufficientEnergy { have: u32, need: u32 },
    #[error("Invalid pull count {requested} (allowed 1..={max})")]
    InvalidPullCount { requested: u32, max: u32 },
    #[error("Storage full (capacity {capacity})")]
    StorageFull { capacity: usize },
    #[error("Not found: {0}")]
    NotFound(String),
}

impl GachaError {
    /// True for errors caused by the player's request rather than a defect
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, GachaError::InvalidWeights(_))
    }
}

pub type GachaResult<T> = Result<T, GachaError>;
