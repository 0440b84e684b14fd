//! Engine configuration.
//!
//! Loaded from `.json` or `.ron` files and validated before use. Defaults
//! are built from [`crate::constants`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{SACRIFICE_ESSENCE_RATIO, SHINY_ODDS};
use crate::energy::EnergyConfig;
use crate::entity::{EntityGenerator, Rarity};
use crate::gacha::Banner;
use crate::pity::PityConfig;
use crate::rng::total_weight;
use crate::tier::TierTable;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GachaConfig {
    #[serde(default)]
    pub pity: PityConfig,
    #[serde(default)]
    pub energy: EnergyConfig,
    #[serde(default = "default_shiny_odds")]
    pub shiny_odds: f64,
    #[serde(default = "default_sacrifice_ratio")]
    pub sacrifice_ratio: f64,
    #[serde(default)]
    pub tiers: TierTable,
    #[serde(default = "default_banners")]
    pub banners: Vec<Banner>,
}

fn default_shiny_odds() -> f64 {
    SHINY_ODDS
}

fn default_sacrifice_ratio() -> f64 {
    SACRIFICE_ESSENCE_RATIO
}

fn default_banners() -> Vec<Banner> {
    vec![Banner::standard()]
}

impl Default for GachaConfig {
    fn default() -> Self {
        Self {
            pity: PityConfig::default(),
            energy: EnergyConfig::default(),
            shiny_odds: default_shiny_odds(),
            sacrifice_ratio: default_sacrifice_ratio(),
            tiers: TierTable::default(),
            banners: default_banners(),
        }
    }
}

impl GachaConfig {
    /// Load and validate a config file; format is picked by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let config = match ext.as_str() {
            "json" => Self::from_json(&text)?,
            "ron" => Self::from_ron(&text)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        tracing::info!(path = %path.display(), banners = config.banners.len(), "config loaded");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(problem) = self.pity.problem() {
            return Err(ConfigError::Invalid(problem));
        }
        if self.energy.max == 0 {
            return Err(ConfigError::Invalid("energy max must be positive".into()));
        }
        if self.energy.regen_secs == 0 {
            return Err(ConfigError::Invalid("energy regen_secs must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.shiny_odds) {
            return Err(ConfigError::Invalid(format!(
                "shiny_odds {} outside [0, 1]",
                self.shiny_odds
            )));
        }
        if !self.sacrifice_ratio.is_finite() || self.sacrifice_ratio < 0.0 {
            return Err(ConfigError::Invalid("sacrifice_ratio must be non-negative".into()));
        }
        for tier in [&self.tiers.guest, &self.tiers.full] {
            if tier.max_pulls_per_request == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{} tier allows no pulls",
                    tier.kind.as_str()
                )));
            }
        }
        if self.banners.is_empty() {
            return Err(ConfigError::Invalid("at least one banner is required".into()));
        }
        for (i, banner) in self.banners.iter().enumerate() {
            if self.banners[..i].iter().any(|b| b.id == banner.id) {
                return Err(ConfigError::Invalid(format!("duplicate banner id '{}'", banner.id)));
            }
            validate_banner(banner)?;
        }
        Ok(())
    }

    pub fn banner(&self, id: &str) -> Option<&Banner> {
        self.banners.iter().find(|b| b.id == id)
    }

    pub fn generator(&self) -> EntityGenerator {
        EntityGenerator::new(self.shiny_odds)
    }
}

fn validate_banner(banner: &Banner) -> Result<(), ConfigError> {
    let table = banner.rarity_table();
    total_weight(table)
        .map_err(|e| ConfigError::Invalid(format!("banner '{}': {}", banner.id, e)))?;
    // Hard pity zeroes common/rare, so a legendary-tier weight must exist
    let top: f64 = table
        .iter()
        .filter(|(r, _)| r.is_legendary_tier())
        .map(|(_, w)| *w)
        .sum();
    if top <= 0.0 {
        return Err(ConfigError::Invalid(format!(
            "banner '{}' has no legendary or mythic weight",
            banner.id
        )));
    }
    if !table.iter().any(|(r, w)| *r == Rarity::Mythic && *w > 0.0) {
        return Err(ConfigError::Invalid(format!(
            "banner '{}' has no mythic weight",
            banner.id
        )));
    }
    Ok(())
}
