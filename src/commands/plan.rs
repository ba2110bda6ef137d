use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::CommandError;
use crate::allocation::{self, materialize_plan};
use crate::db::AppState;
use crate::energy;
use crate::models::{DailyPlan, MealKey, MealSlot, UserProfile};

/// ---------------------------------------------------------------------------
/// Profile & Target Commands
/// ---------------------------------------------------------------------------

/// Daily kcal target for `profile` under the configured formula parameters
pub fn compute_daily_target(state: &AppState, profile: &UserProfile) -> i64 {
  energy::compute_daily_target(profile, &state.config.energy)
}

/// Store the profile with a freshly computed target. Any `kcal_target` on the
/// input is ignored.
pub async fn save_profile(
  state: &AppState,
  mut profile: UserProfile,
) -> Result<UserProfile, CommandError> {
  if profile.age == 0 || !(profile.height_cm > 0.0) || !(profile.weight_kg > 0.0) {
    return Err(CommandError::InvalidInput(
      "age, height and weight must be positive".to_string(),
    ));
  }

  profile.kcal_target = compute_daily_target(state, &profile);
  state.store.put_user(&profile).await?;

  info!(
    sex = %profile.sex,
    activity = %profile.activity,
    goal = %profile.goal,
    kcal_target = profile.kcal_target,
    "Saved profile"
  );
  Ok(profile)
}

/// ---------------------------------------------------------------------------
/// Plan Commands
/// ---------------------------------------------------------------------------

/// Split `target_kcal` over `slots`
pub fn allocate(
  target_kcal: i64,
  slots: &[MealSlot],
) -> Result<BTreeMap<MealKey, i64>, CommandError> {
  let budgets = allocation::allocate(target_kcal, slots)?;
  debug!(target_kcal, ?budgets, "Allocated budget");
  Ok(budgets)
}

/// Build today's plan from the stored target and configured slots, replacing
/// any plan that already exists for the day
pub async fn start_day(state: &AppState, now: NaiveDateTime) -> Result<DailyPlan, CommandError> {
  let user = state
    .store
    .get_user()
    .await?
    .ok_or_else(|| CommandError::NotFound("no profile saved yet".to_string()))?;
  let settings = state.store.get_settings().await?;

  let plan = materialize_plan(now.date(), user.kcal_target, &settings.meal_slots)?;
  state.store.put_plan(&plan).await?;

  info!(
    day = %plan.day_iso(),
    goal = plan.total(),
    slots = settings.meal_slots.len(),
    "Started day plan"
  );
  Ok(plan)
}
