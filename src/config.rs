//! Runtime configuration
//!
//! Read from the process environment after loading an optional `.env` file.

use std::env;

use crate::energy::{EnergyParams, DEFAULT_OTHER_OFFSET};
use crate::quota::{QuotaPolicy, DEFAULT_FREE_ADJUSTMENTS};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const DEFAULT_DATABASE_URL: &str = "sqlite://mealshift.db?mode=rwc";
const DEFAULT_LOG_LEVEL: &str = "info";

pub const ENV_DATABASE_URL: &str = "MEALSHIFT_DATABASE_URL";
pub const ENV_LOG: &str = "MEALSHIFT_LOG";
pub const ENV_OTHER_SEX_OFFSET: &str = "MEALSHIFT_OTHER_SEX_OFFSET";
pub const ENV_FREE_ADJUSTMENTS: &str = "MEALSHIFT_FREE_ADJUSTMENTS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("{name} must be a number, got '{value}'")]
  InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  pub database_url: String,
  pub log_level: String,
  pub energy: EnergyParams,
  pub quota: QuotaPolicy,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      log_level: DEFAULT_LOG_LEVEL.to_string(),
      energy: EnergyParams::default(),
      quota: QuotaPolicy::default(),
    }
  }
}

impl AppConfig {
  /// Load `.env` (if present) and read the environment
  pub fn load() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();
    Self::from_env()
  }

  /// Read the environment only; unset variables fall back to defaults
  pub fn from_env() -> Result<Self, ConfigError> {
    let database_url =
      env::var(ENV_DATABASE_URL).unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let log_level = env::var(ENV_LOG).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

    let other_sex_offset = match env::var(ENV_OTHER_SEX_OFFSET) {
      Ok(value) => value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(ConfigError::InvalidNumber {
          name: ENV_OTHER_SEX_OFFSET,
          value,
        })?,
      Err(_) => DEFAULT_OTHER_OFFSET,
    };

    let free_per_day = match env::var(ENV_FREE_ADJUSTMENTS) {
      Ok(value) => value
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidNumber {
          name: ENV_FREE_ADJUSTMENTS,
          value,
        })?,
      Err(_) => DEFAULT_FREE_ADJUSTMENTS,
    };

    Ok(Self {
      database_url,
      log_level,
      energy: EnergyParams { other_sex_offset },
      quota: QuotaPolicy { free_per_day },
    })
  }
}
