use std::collections::BTreeSet;
use tracing::{info, warn};

use super::CommandError;
use crate::allocation::{MAX_SLOTS, MIN_SLOTS};
use crate::db::AppState;
use crate::models::{MealSlot, MealTimes, Settings};
use crate::store::legacy::{import_legacy, ImportReport, LegacyDump};

pub async fn get_settings(state: &AppState) -> Result<Settings, CommandError> {
  Ok(state.store.get_settings().await?)
}

/// Replace the configured meal slots. Weights are normalized to sum to 1 and
/// slots are kept in canonical order.
pub async fn save_meal_slots(
  state: &AppState,
  slots: Vec<MealSlot>,
) -> Result<Settings, CommandError> {
  if !(MIN_SLOTS..=MAX_SLOTS).contains(&slots.len()) {
    return Err(CommandError::Configuration(format!(
      "expected {} to {} meal slots, got {}",
      MIN_SLOTS,
      MAX_SLOTS,
      slots.len()
    )));
  }

  let keys: BTreeSet<_> = slots.iter().map(|s| s.key).collect();
  if keys.len() != slots.len() {
    return Err(CommandError::Configuration(
      "each meal slot may appear only once".to_string(),
    ));
  }

  let weight = |s: &MealSlot| {
    if s.percent.is_finite() && s.percent > 0.0 {
      s.percent
    } else {
      0.0
    }
  };
  let total: f64 = slots.iter().map(weight).sum();
  if total == 0.0 {
    return Err(CommandError::Configuration(
      "slot weights sum to zero".to_string(),
    ));
  }

  let mut normalized: Vec<MealSlot> = slots
    .iter()
    .map(|s| MealSlot::new(s.key, weight(s) / total))
    .collect();
  normalized.sort_by_key(|s| s.key);

  let _guard = state.adjust_lock.lock().await;
  let mut settings = state.store.get_settings().await?;
  settings.meal_slots = normalized;
  state.store.put_settings(&settings).await?;

  info!(slots = settings.meal_slots.len(), "Saved meal slots");
  Ok(settings)
}

pub async fn save_meal_times(
  state: &AppState,
  meal_times: MealTimes,
) -> Result<Settings, CommandError> {
  let _guard = state.adjust_lock.lock().await;
  let mut settings = state.store.get_settings().await?;
  settings.meal_times = meal_times;
  state.store.put_settings(&settings).await?;
  Ok(settings)
}

/// Record the paywall's answer. Entitled users skip the daily quota.
pub async fn set_entitlement(state: &AppState, active: bool) -> Result<Settings, CommandError> {
  let _guard = state.adjust_lock.lock().await;
  let mut settings = state.store.get_settings().await?;
  settings.pro_active = active;
  state.store.put_settings(&settings).await?;

  info!(pro_active = active, "Updated entitlement");
  Ok(settings)
}

/// One-shot import of data exported by the earlier build
pub async fn import_legacy_dump(
  state: &AppState,
  dump: LegacyDump,
) -> Result<ImportReport, CommandError> {
  let report = {
    let _guard = state.adjust_lock.lock().await;
    import_legacy(state.store.as_ref(), dump).await?
  };
  if !report.imported {
    warn!("Legacy dump ignored because the store already has data");
  }
  Ok(report)
}
