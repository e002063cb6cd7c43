// ⚙️ Configuration - banding tunables and application settings
//
// BandingConfig holds the two tunables of the price band pipeline.
// AppConfig adds where the SQLite database lives. Both load from JSON.

use crate::error::{BandingError, Result as BandingResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ROUNDING_UNIT: i64 = 50;
pub const DEFAULT_MAX_NUM_BANDS: i64 = 5;
pub const DEFAULT_DATABASE_PATH: &str = "sales.db";

// ============================================================================
// BANDING CONFIG
// ============================================================================

/// Tunables for computing price bands
///
/// Both values are strictly positive once constructed through `new` or
/// validated after deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandingConfig {
    /// Granularity the band width is rounded up to (minor currency units)
    #[serde(default = "default_rounding_unit")]
    rounding_unit: i64,

    /// Upper bound on the number of bands generated
    #[serde(default = "default_max_num_bands")]
    max_num_bands: i64,
}

fn default_rounding_unit() -> i64 {
    DEFAULT_ROUNDING_UNIT
}

fn default_max_num_bands() -> i64 {
    DEFAULT_MAX_NUM_BANDS
}

impl BandingConfig {
    pub fn new(rounding_unit: i64, max_num_bands: i64) -> BandingResult<Self> {
        let config = BandingConfig {
            rounding_unit,
            max_num_bands,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject non-positive tunables
    pub fn validate(&self) -> BandingResult<()> {
        if self.rounding_unit <= 0 {
            return Err(BandingError::InvalidConfiguration {
                field: "rounding_unit",
                value: self.rounding_unit,
            });
        }
        if self.max_num_bands <= 0 {
            return Err(BandingError::InvalidConfiguration {
                field: "max_num_bands",
                value: self.max_num_bands,
            });
        }
        Ok(())
    }

    pub fn rounding_unit(&self) -> i64 {
        self.rounding_unit
    }

    pub fn max_num_bands(&self) -> i64 {
        self.max_num_bands
    }

    /// Copy with either tunable replaced, re-validated
    pub fn with_overrides(
        &self,
        rounding_unit: Option<i64>,
        max_num_bands: Option<i64>,
    ) -> BandingResult<Self> {
        BandingConfig::new(
            rounding_unit.unwrap_or(self.rounding_unit),
            max_num_bands.unwrap_or(self.max_num_bands),
        )
    }
}

impl Default for BandingConfig {
    fn default() -> Self {
        BandingConfig {
            rounding_unit: DEFAULT_ROUNDING_UNIT,
            max_num_bands: DEFAULT_MAX_NUM_BANDS,
        }
    }
}

// ============================================================================
// APP CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default)]
    pub banding: BandingConfig,
}

fn default_database_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE_PATH)
}

impl AppConfig {
    /// Load settings from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: AppConfig =
            serde_json::from_str(content).context("Failed to parse config JSON")?;
        config
            .banding
            .validate()
            .context("Config file contains invalid banding settings")?;

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: default_database_path(),
            banding: BandingConfig::default(),
        }
    }
}
