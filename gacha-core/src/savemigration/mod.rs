//! Versioned, checksummed save envelope.
//!
//! Saves are stored as `{ "version", "checksum", "state" }`:
//! - `checksum` is SHA3-256 (hex) over the canonical JSON bytes of `state`
//!   as written at that version (object keys sorted)
//! - Migration functions transform v(N) -> v(N+1) -> ... -> v(current)
//! - Old saves are never lost, always migrated forward
//! - Unknown future versions are rejected (no downgrade)

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha3::{Digest, Sha3_256};
use tracing::{info, warn};

use crate::state::PersistedState;

/// Current save format version
pub const CURRENT_SAVE_VERSION: u32 = 3;

/// Minimum supported version (anything below cannot be migrated)
pub const MIN_SUPPORTED_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("save version {save_version} is newer than supported {max_supported}")]
    FutureVersion { save_version: u32, max_supported: u32 },
    #[error("save version {save_version} is older than minimum {min_supported}")]
    TooOldVersion { save_version: u32, min_supported: u32 },
    #[error("invalid save format: {0}")]
    InvalidFormat(String),
    #[error("checksum mismatch (expected {expected}, computed {actual})")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("migration from v{from_version} failed: {detail}")]
    MigrationStepFailed { from_version: u32, detail: String },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What a decode had to do to bring a save up to date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub original_version: u32,
    pub final_version: u32,
    pub steps_applied: Vec<String>,
}

impl MigrationReport {
    pub fn migrated(&self) -> bool {
        !self.steps_applied.is_empty()
    }
}

/// Hex SHA3-256 over the canonical JSON encoding of `state`
pub fn state_checksum(state: &Value) -> Result<String, SaveError> {
    let bytes = serde_json::to_vec(state)?;
    let mut hasher = Sha3_256::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

/// Serialize `state` into a current-version envelope
pub fn encode_save(state: &PersistedState) -> Result<String, SaveError> {
    let mut value = serde_json::to_value(state)?;
    value["version"] = json!(CURRENT_SAVE_VERSION);
    let checksum = state_checksum(&value)?;
    let envelope = json!({
        "version": CURRENT_SAVE_VERSION,
        "checksum": checksum,
        "state": value,
    });
    Ok(serde_json::to_string(&envelope)?)
}

/// Parse an envelope of any supported version, verify it, migrate it forward
pub fn decode_save(json_str: &str) -> Result<(PersistedState, MigrationReport), SaveError> {
    let envelope: Value = serde_json::from_str(json_str)?;

    let version = envelope
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| SaveError::InvalidFormat("missing or invalid 'version' field".into()))?;

    if version > CURRENT_SAVE_VERSION {
        return Err(SaveError::FutureVersion {
            save_version: version,
            max_supported: CURRENT_SAVE_VERSION,
        });
    }
    if version < MIN_SUPPORTED_VERSION {
        return Err(SaveError::TooOldVersion {
            save_version: version,
            min_supported: MIN_SUPPORTED_VERSION,
        });
    }

    let expected = envelope
        .get("checksum")
        .and_then(Value::as_str)
        .ok_or_else(|| SaveError::InvalidFormat("missing 'checksum' field".into()))?
        .to_string();
    let mut state = envelope
        .get("state")
        .cloned()
        .ok_or_else(|| SaveError::InvalidFormat("missing 'state' field".into()))?;

    let actual = state_checksum(&state)?;
    if actual != expected {
        warn!(version, "rejecting save with bad checksum");
        return Err(SaveError::ChecksumMismatch { expected, actual });
    }

    let steps = migrate_state(&mut state, version)?;
    if !steps.is_empty() {
        info!(from = version, to = CURRENT_SAVE_VERSION, steps = steps.len(), "save migrated");
    }

    let persisted: PersistedState = serde_json::from_value(state)?;
    Ok((
        persisted,
        MigrationReport {
            original_version: version,
            final_version: CURRENT_SAVE_VERSION,
            steps_applied: steps,
        },
    ))
}

/// Bring a state value from `from_version` up to [`CURRENT_SAVE_VERSION`]
pub fn migrate_state(state: &mut Value, from_version: u32) -> Result<Vec<String>, SaveError> {
    let mut current = from_version;
    let mut steps = Vec::new();
    while current < CURRENT_SAVE_VERSION {
        let description = apply_migration_step(state, current).map_err(|detail| {
            SaveError::MigrationStepFailed {
                from_version: current,
                detail,
            }
        })?;
        steps.push(description);
        current += 1;
    }
    state["version"] = json!(CURRENT_SAVE_VERSION);
    Ok(steps)
}

fn apply_migration_step(state: &mut Value, from_version: u32) -> Result<String, String> {
    match from_version {
        1 => migrate_v1_to_v2(state),
        2 => migrate_v2_to_v3(state),
        _ => Err(format!("No migration path from version {}", from_version)),
    }
}

fn player_mut(state: &mut Value) -> Result<&mut serde_json::Map<String, Value>, String> {
    state
        .get_mut("player")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| "save state has no 'player' object".to_string())
}

/// Migration v1 -> v2:
/// - Ledger fields `soft`/`premium` renamed to `essence`/`crystals`
/// - Pull state gains `legendaries_since_mythic` and `banner_pulls`
fn migrate_v1_to_v2(state: &mut Value) -> Result<String, String> {
    let player = player_mut(state)?;

    let ledger = player
        .get_mut("ledger")
        .and_then(Value::as_object_mut)
        .ok_or("player has no 'ledger' object")?;
    for (old, new) in [("soft", "essence"), ("premium", "crystals")] {
        let amount = ledger.remove(old).unwrap_or(json!(0));
        ledger.entry(new).or_insert(amount);
    }

    let pulls = player
        .get_mut("pulls")
        .and_then(Value::as_object_mut)
        .ok_or("player has no 'pulls' object")?;
    pulls
        .entry("legendaries_since_mythic")
        .or_insert(json!(0));
    pulls.entry("banner_pulls").or_insert(json!({}));

    Ok("v1→v2: ledger soft/premium renamed, mythic guarantee counter added".to_string())
}

/// Migration v2 -> v3:
/// - Added `streak`, `season` and `stats`
/// - `stats.total_pulls` seeded from the per-banner pull history
fn migrate_v2_to_v3(state: &mut Value) -> Result<String, String> {
    let player = player_mut(state)?;

    let total_pulls: u64 = player
        .get("pulls")
        .and_then(|p| p.get("banner_pulls"))
        .and_then(Value::as_object)
        .map(|history| history.values().filter_map(Value::as_u64).sum())
        .unwrap_or(0);

    player.entry("streak").or_insert(json!({
        "current": 0,
        "best": 0,
        "last_login_day": null
    }));
    player.entry("season").or_insert(json!({ "xp": 0 }));
    player.entry("stats").or_insert(json!({
        "total_pulls": total_pulls,
        "total_sacrificed": 0,
        "shiny_pulls": 0,
        "essence_earned": 0
    }));

    Ok("v2→v3: added streak, season pass and lifetime stats".to_string())
}
