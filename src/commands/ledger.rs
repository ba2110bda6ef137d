use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::CommandError;
use crate::db::AppState;
use crate::ledger::DaySummary;
use crate::models::{DailyPlan, Entry, EntryOrigin, Food, MealKey, NewEntry, NewFood, Settings};

/// ---------------------------------------------------------------------------
/// Logging Commands
/// ---------------------------------------------------------------------------

async fn ensure_configured(state: &AppState, meal: MealKey) -> Result<(), CommandError> {
  let settings = state.store.get_settings().await?;
  if settings.meal_slots.iter().any(|s| s.key == meal) {
    Ok(())
  } else {
    Err(CommandError::InvalidInput(format!(
      "meal {} is not configured",
      meal
    )))
  }
}

/// Log a free-text item with a hand-typed calorie count
pub async fn log_text_entry(
  state: &AppState,
  now: NaiveDateTime,
  meal: MealKey,
  name: &str,
  kcal: i64,
) -> Result<Entry, CommandError> {
  let name = name.trim();
  if name.is_empty() {
    return Err(CommandError::InvalidInput("name is required".to_string()));
  }
  if kcal <= 0 {
    return Err(CommandError::InvalidInput(format!(
      "kcal must be positive, got {}",
      kcal
    )));
  }
  ensure_configured(state, meal).await?;

  let entry = state
    .store
    .add_entry(&NewEntry {
      day: now.date(),
      meal,
      name: name.to_string(),
      kcal,
      origin: EntryOrigin::Text,
      qty: None,
    })
    .await?;

  info!(meal = %meal, kcal, "Logged text entry");
  Ok(entry)
}

/// Log `qty` portions of a catalog item
pub async fn log_catalog_entry(
  state: &AppState,
  now: NaiveDateTime,
  meal: MealKey,
  food_id: i64,
  qty: f64,
) -> Result<Entry, CommandError> {
  if !qty.is_finite() || qty <= 0.0 {
    return Err(CommandError::InvalidInput(format!(
      "quantity must be positive, got {}",
      qty
    )));
  }
  ensure_configured(state, meal).await?;

  let food = state
    .store
    .get_food(food_id)
    .await?
    .ok_or_else(|| CommandError::NotFound(format!("food {}", food_id)))?;

  let kcal = (food.kcal_per_portion * qty).round().max(0.0) as i64;
  let entry = state
    .store
    .add_entry(&NewEntry {
      day: now.date(),
      meal,
      name: format!("{} ({}× {})", food.name, qty, food.base_portion),
      kcal,
      origin: EntryOrigin::Catalog,
      qty: Some(qty),
    })
    .await?;

  info!(meal = %meal, food_id, qty, kcal, "Logged catalog entry");
  Ok(entry)
}

/// ---------------------------------------------------------------------------
/// Catalog Commands
/// ---------------------------------------------------------------------------

pub async fn search_foods(state: &AppState, query: &str) -> Result<Vec<Food>, CommandError> {
  let foods = state.store.search_foods(query).await?;
  debug!(query, hits = foods.len(), "Searched foods");
  Ok(foods)
}

/// Load the bundled catalog on first run. Returns how many items were added,
/// 0 if the catalog already had any.
pub async fn seed_foods(state: &AppState, foods: &[NewFood]) -> Result<usize, CommandError> {
  if !state.store.search_foods("").await?.is_empty() {
    return Ok(0);
  }
  let added = state.store.add_foods(foods).await?;
  info!(added, "Seeded food catalog");
  Ok(added)
}

/// ---------------------------------------------------------------------------
/// Summary Commands
/// ---------------------------------------------------------------------------

/// Rows to show for a day: the configured slots, plus any slot the plan still
/// budgets or that has intake logged against it
fn summary_meals(settings: &Settings, plan: &DailyPlan, entries: &[Entry]) -> Vec<MealKey> {
  let mut meals: BTreeSet<MealKey> = settings.meal_slots.iter().map(|s| s.key).collect();
  meals.extend(
    plan
      .budgets()
      .into_iter()
      .filter(|(_, kcal)| *kcal != 0)
      .map(|(key, _)| key),
  );
  meals.extend(entries.iter().map(|e| e.meal));
  meals.into_iter().collect()
}

/// Plan vs. intake for today; `None` until the day has been started
pub async fn today_summary(
  state: &AppState,
  now: NaiveDateTime,
) -> Result<Option<DaySummary>, CommandError> {
  let today = now.date();
  let Some(plan) = state.store.get_plan(today).await? else {
    return Ok(None);
  };
  let entries = state.store.get_entries(today).await?;
  let settings = state.store.get_settings().await?;

  let meals = summary_meals(&settings, &plan, &entries);
  Ok(Some(DaySummary::compute(&plan, &entries, &meals)))
}

/// Every planned day, most recent first
pub async fn day_history(state: &AppState) -> Result<Vec<DaySummary>, CommandError> {
  let settings = state.store.get_settings().await?;

  let mut history = Vec::new();
  for plan in state.store.list_plans().await? {
    let entries = state.store.get_entries(plan.day).await?;
    let meals = summary_meals(&settings, &plan, &entries);
    history.push(DaySummary::compute(&plan, &entries, &meals));
  }
  Ok(history)
}
