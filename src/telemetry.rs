//! Logging setup
//!
//! `RUST_LOG` wins over the configured level when it is set.

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
  #[error("invalid log level/filter '{value}'")]
  EnvFilter {
    value: String,
    #[source]
    source: ParseError,
  },

  #[error("failed to install subscriber: {0}")]
  Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

/// Build the filter from `RUST_LOG`, falling back to the configured level
pub fn env_filter(log_level: &str) -> Result<EnvFilter, TelemetryError> {
  match EnvFilter::try_from_default_env() {
    Ok(filter) => Ok(filter),
    Err(_) => EnvFilter::try_new(log_level).map_err(|source| TelemetryError::EnvFilter {
      value: log_level.to_string(),
      source,
    }),
  }
}

/// Install the global fmt subscriber. Fails if one is already installed.
pub fn init(config: &AppConfig) -> Result<(), TelemetryError> {
  tracing_subscriber::fmt()
    .with_env_filter(env_filter(&config.log_level)?)
    .with_target(false)
    .compact()
    .try_init()
    .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn test_env_filter_accepts_configured_level() {
    temp_env::with_var_unset("RUST_LOG", || {
      assert!(env_filter("mealshift=debug,sqlx=warn").is_ok());
    });
  }

  #[test]
  #[serial]
  fn test_env_filter_rejects_garbage() {
    temp_env::with_var_unset("RUST_LOG", || {
      let err = env_filter("mealshift=loud").unwrap_err();
      assert!(err.to_string().contains("mealshift=loud"));
    });
  }
}
