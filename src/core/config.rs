//! Quota limits shared by both robots.
//!
//! Defaults are 1..=2 liters of water per day and 4..=8 cut branches per week.
//! A store may override them in `<root>/arborist.toml`:
//!
//! ```toml
//! [quota]
//! max_water_per_day = 2.0
//! min_water_per_day = 1.0
//! max_branches_per_week = 8
//! min_branches_per_week = 4
//! ```

use crate::core::error::ArboristError;
use crate::core::schemas;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QuotaConfig {
    pub max_water_per_day: f64,
    pub min_water_per_day: f64,
    pub max_branches_per_week: i64,
    pub min_branches_per_week: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_water_per_day: 2.0,
            min_water_per_day: 1.0,
            max_branches_per_week: 8,
            min_branches_per_week: 4,
        }
    }
}

impl QuotaConfig {
    pub fn validate(&self) -> Result<(), ArboristError> {
        if !self.max_water_per_day.is_finite() || self.max_water_per_day <= 0.0 {
            return Err(ArboristError::InvalidConfiguration(format!(
                "max_water_per_day must be > 0, got {}",
                self.max_water_per_day
            )));
        }
        if !self.min_water_per_day.is_finite() || self.min_water_per_day < 0.0 {
            return Err(ArboristError::InvalidConfiguration(format!(
                "min_water_per_day must be >= 0, got {}",
                self.min_water_per_day
            )));
        }
        if self.min_water_per_day > self.max_water_per_day {
            return Err(ArboristError::InvalidConfiguration(format!(
                "min_water_per_day ({}) exceeds max_water_per_day ({})",
                self.min_water_per_day, self.max_water_per_day
            )));
        }
        if self.max_branches_per_week <= 0 {
            return Err(ArboristError::InvalidConfiguration(format!(
                "max_branches_per_week must be > 0, got {}",
                self.max_branches_per_week
            )));
        }
        if self.min_branches_per_week < 0 {
            return Err(ArboristError::InvalidConfiguration(format!(
                "min_branches_per_week must be >= 0, got {}",
                self.min_branches_per_week
            )));
        }
        if self.min_branches_per_week > self.max_branches_per_week {
            return Err(ArboristError::InvalidConfiguration(format!(
                "min_branches_per_week ({}) exceeds max_branches_per_week ({})",
                self.min_branches_per_week, self.max_branches_per_week
            )));
        }
        Ok(())
    }
}

/// The arborist.toml file structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArboristConfig {
    #[serde(default)]
    pub quota: QuotaConfig,
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(schemas::CONFIG_FILE_NAME)
}

/// Load and validate the store's quota configuration.
/// No config file means the default limits (not an error).
pub fn load_config(root: &Path) -> Result<ArboristConfig, ArboristError> {
    let path = config_path(root);
    if !path.exists() {
        return Ok(ArboristConfig::default());
    }

    let content = fs::read_to_string(&path).map_err(ArboristError::IoError)?;
    let config: ArboristConfig = toml::from_str(&content).map_err(|e| {
        ArboristError::InvalidConfiguration(format!("{}: {}", path.display(), e))
    })?;
    config.quota.validate()?;
    Ok(config)
}

/// Write the default config next to the journal unless one is already there.
pub fn write_default_config(root: &Path) -> Result<bool, ArboristError> {
    let path = config_path(root);
    if path.exists() {
        return Ok(false);
    }
    let content = toml::to_string_pretty(&ArboristConfig::default())
        .map_err(|e| ArboristError::InvalidConfiguration(e.to_string()))?;
    fs::write(&path, content).map_err(ArboristError::IoError)?;
    Ok(true)
}
