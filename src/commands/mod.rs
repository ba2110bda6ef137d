//! Operations the UI shell calls
//!
//! Every command takes the shared [`AppState`](crate::db::AppState) and
//! returns a serializable result, so the shell can forward it as-is.

pub mod adjust;
pub mod ledger;
pub mod plan;
pub mod settings;

use serde::{Deserialize, Serialize};

use crate::allocation::AllocationError;
use crate::store::legacy::MigrationError;
use crate::store::StoreError;

pub use adjust::{
  apply_readjustment, check_quota, open_adjustment, preview_readjustment, AdjustmentContext,
  ApplyOutcome, PendingAdjustment,
};
pub use ledger::{
  day_history, log_catalog_entry, log_text_entry, search_foods, seed_foods, today_summary,
};
pub use plan::{allocate, compute_daily_target, save_profile, start_day};
pub use settings::{
  get_settings, import_legacy_dump, save_meal_slots, save_meal_times, set_entitlement,
};

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CommandError {
  #[error("Invalid meal plan configuration: {0}")]
  Configuration(String),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Persistence failure: {0}")]
  Store(String),

  #[error("Legacy import failed: {0}")]
  Migration(String),
}

impl From<AllocationError> for CommandError {
  fn from(err: AllocationError) -> Self {
    match err {
      AllocationError::ZeroWeights => {
        CommandError::Configuration("slot weights sum to zero".to_string())
      }
    }
  }
}

impl From<StoreError> for CommandError {
  fn from(err: StoreError) -> Self {
    CommandError::Store(err.to_string())
  }
}

impl From<MigrationError> for CommandError {
  fn from(err: MigrationError) -> Self {
    CommandError::Migration(err.to_string())
  }
}
