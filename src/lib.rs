pub mod allocation;
pub mod commands;
pub mod config;
pub mod db;
pub mod energy;
pub mod ledger;
pub mod models;
pub mod quota;
pub mod readjust;
pub mod store;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

pub use commands::CommandError;
pub use config::AppConfig;
pub use db::AppState;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
  #[error("Configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("Logging setup failed: {0}")]
  Telemetry(#[from] telemetry::TelemetryError),

  #[error("Failed to initialize database: {0}")]
  Store(#[from] store::StoreError),
}

/// Load `.env` and the environment, install logging and open the database.
/// The UI shell calls this once and keeps the returned state for commands.
pub async fn run() -> Result<AppState, StartupError> {
  let config = AppConfig::load()?;
  telemetry::init(&config)?;

  let state = AppState::open(config).await?;
  tracing::info!("Database ready");
  Ok(state)
}
