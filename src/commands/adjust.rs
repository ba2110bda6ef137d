//! "Ate out" readjustment commands
//!
//! The UI opens an [`AdjustmentContext`] once, previews as the user types the
//! extra calories, then hands a [`PendingAdjustment`] to
//! [`apply_readjustment`]. Applying consumes the pending value.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::CommandError;
use crate::db::AppState;
use crate::ledger::{quick_picks, total_consumed, QuickPick};
use crate::models::{DailyPlan, Settings};
use crate::quota::QuotaStatus;
use crate::readjust::{readjust, schedule_from_settings, ReadjustOutcome, Readjustment, ScheduledSlot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "result", rename_all = "snake_case")]
pub enum ApplyOutcome {
  Applied(Readjustment),
  /// Free readjustments are used up for today; nothing was changed
  QuotaExceeded,
  NoRemainingSlots,
}

/// Roll the counter over if the day changed. Returns whether it did.
/// Callers hold `adjust_lock`.
async fn roll_over_quota(
  state: &AppState,
  settings: &mut Settings,
  today: NaiveDate,
) -> Result<bool, CommandError> {
  if settings.quota.roll_over(today) {
    state.store.put_settings(settings).await?;
    debug!(day = %today, "Reset daily readjustment counter");
    return Ok(true);
  }
  Ok(false)
}

/// Whether a readjustment can be applied right now
pub async fn check_quota(state: &AppState, now: NaiveDateTime) -> Result<QuotaStatus, CommandError> {
  let _guard = state.adjust_lock.lock().await;
  let mut settings = state.store.get_settings().await?;
  roll_over_quota(state, &mut settings, now.date()).await?;
  Ok(settings.quota.status(settings.pro_active, &state.config.quota))
}

/// ---------------------------------------------------------------------------
/// Preview
/// ---------------------------------------------------------------------------

/// Everything the readjustment sheet needs, loaded once
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustmentContext {
  pub plan: DailyPlan,
  pub consumed_so_far: i64,
  pub schedule: Vec<ScheduledSlot>,
  pub quota: QuotaStatus,
  /// `None` for entitled users
  pub remaining_free: Option<u32>,
  pub quick_picks: Vec<QuickPick>,
}

impl AdjustmentContext {
  pub fn preview(&self, extra_kcal: i64, now: NaiveTime) -> Result<ReadjustOutcome, CommandError> {
    preview_readjustment(&self.plan, extra_kcal, self.consumed_so_far, now, &self.schedule)
  }
}

pub async fn open_adjustment(
  state: &AppState,
  now: NaiveDateTime,
) -> Result<AdjustmentContext, CommandError> {
  let today = now.date();
  let plan = state
    .store
    .get_plan(today)
    .await?
    .ok_or_else(|| CommandError::NotFound(format!("no plan for {}", today)))?;
  let consumed_so_far = total_consumed(&state.store.get_entries(today).await?);

  let settings = {
    let _guard = state.adjust_lock.lock().await;
    let mut settings = state.store.get_settings().await?;
    roll_over_quota(state, &mut settings, today).await?;
    settings
  };
  let policy = &state.config.quota;

  Ok(AdjustmentContext {
    quick_picks: quick_picks(plan.total() - consumed_so_far),
    schedule: schedule_from_settings(&settings),
    quota: settings.quota.status(settings.pro_active, policy),
    remaining_free: settings.quota.remaining_free(settings.pro_active, policy),
    plan,
    consumed_so_far,
  })
}

/// Side-effect free preview of a readjustment
pub fn preview_readjustment(
  plan: &DailyPlan,
  extra_kcal: i64,
  consumed_so_far: i64,
  now: NaiveTime,
  schedule: &[ScheduledSlot],
) -> Result<ReadjustOutcome, CommandError> {
  let outcome = readjust(plan, extra_kcal, consumed_so_far, now, schedule)?;
  debug!(extra_kcal, consumed_so_far, ?outcome, "Previewed readjustment");
  Ok(outcome)
}

/// ---------------------------------------------------------------------------
/// Apply
/// ---------------------------------------------------------------------------

/// A readjustment the user confirmed but that has not been applied yet.
/// Not `Clone`; applying consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingAdjustment {
  extra_kcal: i64,
}

impl PendingAdjustment {
  pub fn new(extra_kcal: i64) -> Self {
    Self {
      extra_kcal: extra_kcal.max(0),
    }
  }

  pub fn extra_kcal(&self) -> i64 {
    self.extra_kcal
  }
}

/// Apply a readjustment to today's plan.
///
/// The quota is checked and incremented under the state's adjustment lock,
/// and the new plan is committed together with the incremented counter.
/// `QuotaExceeded` and `NoRemainingSlots` leave both untouched.
pub async fn apply_readjustment(
  state: &AppState,
  pending: PendingAdjustment,
  now: NaiveDateTime,
) -> Result<ApplyOutcome, CommandError> {
  let _guard = state.adjust_lock.lock().await;
  let today = now.date();

  let mut settings = state.store.get_settings().await?;
  roll_over_quota(state, &mut settings, today).await?;

  if settings.quota.status(settings.pro_active, &state.config.quota) == QuotaStatus::Exhausted {
    warn!(
      adjustments_today = settings.quota.adjustments_today,
      "Readjustment blocked: daily quota exhausted"
    );
    return Ok(ApplyOutcome::QuotaExceeded);
  }

  let plan = state
    .store
    .get_plan(today)
    .await?
    .ok_or_else(|| CommandError::NotFound(format!("no plan for {}", today)))?;
  let consumed_so_far = total_consumed(&state.store.get_entries(today).await?);
  let schedule = schedule_from_settings(&settings);

  match readjust(&plan, pending.extra_kcal, consumed_so_far, now.time(), &schedule)? {
    ReadjustOutcome::NoRemainingSlots => {
      info!(day = %today, "No meal slots left to readjust");
      Ok(ApplyOutcome::NoRemainingSlots)
    }
    ReadjustOutcome::Rebalanced(result) => {
      settings.quota.record_applied(today);
      state
        .store
        .commit_adjustment(&result.plan, &settings)
        .await?;

      info!(
        day = %today,
        extra_kcal = pending.extra_kcal,
        remaining_budget = result.remaining_budget,
        adjustments_today = settings.quota.adjustments_today,
        "Applied readjustment"
      );
      Ok(ApplyOutcome::Applied(result))
    }
  }
}
