//! SQLite-backed [`MealStore`]

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};
use tracing::debug;

use super::{filter_foods, ImportBatch, MealStore, StoreError};
use crate::models::{
  day_iso, format_clock, parse_clock, parse_day_iso, DailyPlan, Entry, EntryOrigin, Food, MealKey,
  MealSlot, MealTimes, NewEntry, NewFood, Settings, UserProfile,
};
use crate::quota::AdjustmentQuota;

pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> StoreError {
  StoreError::Corrupt(format!("{}: {}", what, err))
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn user_from_row(row: &SqliteRow) -> Result<UserProfile, StoreError> {
  let sex: String = row.get("sex");
  let goal: String = row.get("goal");
  let activity: String = row.get("activity");
  let age: i64 = row.get("age");

  Ok(UserProfile {
    sex: sex.parse().map_err(|e| corrupt("users.sex", e))?,
    age: u32::try_from(age).map_err(|e| corrupt("users.age", e))?,
    height_cm: row.get("height_cm"),
    weight_kg: row.get("weight_kg"),
    goal: goal.parse().map_err(|e| corrupt("users.goal", e))?,
    activity: activity.parse().map_err(|e| corrupt("users.activity", e))?,
    kcal_target: row.get("kcal_target"),
  })
}

fn plan_from_row(row: &SqliteRow) -> Result<DailyPlan, StoreError> {
  let day: String = row.get("day_iso");
  Ok(DailyPlan {
    day: parse_day_iso(&day).map_err(|e| corrupt("plans.day_iso", e))?,
    breakfast_kcal: row.get("breakfast_kcal"),
    lunch_kcal: row.get("lunch_kcal"),
    snack_kcal: row.get("snack_kcal"),
    dinner_kcal: row.get("dinner_kcal"),
  })
}

fn entry_from_row(row: &SqliteRow) -> Result<Entry, StoreError> {
  let day: String = row.get("day_iso");
  let meal: String = row.get("meal");
  let origin: String = row.get("origin");

  Ok(Entry {
    id: row.get("id"),
    day: parse_day_iso(&day).map_err(|e| corrupt("entries.day_iso", e))?,
    meal: meal.parse::<MealKey>().map_err(|e| corrupt("entries.meal", e))?,
    name: row.get("name"),
    kcal: row.get("kcal"),
    origin: origin
      .parse::<EntryOrigin>()
      .map_err(|e| corrupt("entries.origin", e))?,
    qty: row.get("qty"),
  })
}

fn food_from_row(row: &SqliteRow) -> Result<Food, StoreError> {
  let tags_json: String = row.get("tags_json");
  Ok(Food {
    id: row.get("id"),
    name: row.get("name"),
    base_portion: row.get("base_portion"),
    kcal_per_portion: row.get("kcal_per_portion"),
    tags: serde_json::from_str(&tags_json).map_err(|e| corrupt("foods.tags_json", e))?,
  })
}

fn settings_from_row(row: &SqliteRow) -> Result<Settings, StoreError> {
  let slots_json: String = row.get("meal_slots_json");
  let meal_slots: Vec<MealSlot> =
    serde_json::from_str(&slots_json).map_err(|e| corrupt("settings.meal_slots_json", e))?;

  let clock = |column: &str| -> Result<chrono::NaiveTime, StoreError> {
    let value: String = row.get(column);
    parse_clock(&value).map_err(|e| corrupt(column, e))
  };
  let meal_times = MealTimes {
    breakfast: clock("breakfast_time")?,
    lunch: clock("lunch_time")?,
    snack: clock("snack_time")?,
    dinner: clock("dinner_time")?,
  };

  let adjustments_today: i64 = row.get("adjustments_today");
  let last_reset_date: Option<String> = row.get("last_reset_date");
  let last_reset_date = match last_reset_date {
    Some(value) => Some(parse_day_iso(&value).map_err(|e| corrupt("settings.last_reset_date", e))?),
    None => None,
  };

  Ok(Settings {
    meal_slots,
    meal_times,
    pro_active: row.get::<i64, _>("pro_active") != 0,
    quota: AdjustmentQuota {
      adjustments_today: u32::try_from(adjustments_today.max(0)).unwrap_or(u32::MAX),
      last_reset_date,
    },
    consent_notifications: row.get::<i64, _>("consent_notifications") != 0,
  })
}

// ---------------------------------------------------------------------------
// Writes shared by the pool and transactions
// ---------------------------------------------------------------------------

async fn upsert_plan<'e, E: SqliteExecutor<'e>>(
  executor: E,
  plan: &DailyPlan,
) -> Result<(), StoreError> {
  sqlx::query(
    r#"
    INSERT INTO plans (day_iso, breakfast_kcal, lunch_kcal, snack_kcal, dinner_kcal)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(day_iso) DO UPDATE SET
      breakfast_kcal = excluded.breakfast_kcal,
      lunch_kcal = excluded.lunch_kcal,
      snack_kcal = excluded.snack_kcal,
      dinner_kcal = excluded.dinner_kcal,
      updated_at = CURRENT_TIMESTAMP
    "#,
  )
  .bind(plan.day_iso())
  .bind(plan.breakfast_kcal)
  .bind(plan.lunch_kcal)
  .bind(plan.snack_kcal)
  .bind(plan.dinner_kcal)
  .execute(executor)
  .await?;
  Ok(())
}

async fn upsert_user<'e, E: SqliteExecutor<'e>>(
  executor: E,
  user: &UserProfile,
) -> Result<(), StoreError> {
  // Single-user app: the profile always lives in row 1
  sqlx::query(
    r#"
    INSERT INTO users (id, sex, age, height_cm, weight_kg, goal, activity, kcal_target)
    VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(id) DO UPDATE SET
      sex = excluded.sex,
      age = excluded.age,
      height_cm = excluded.height_cm,
      weight_kg = excluded.weight_kg,
      goal = excluded.goal,
      activity = excluded.activity,
      kcal_target = excluded.kcal_target
    "#,
  )
  .bind(user.sex.to_string())
  .bind(i64::from(user.age))
  .bind(user.height_cm)
  .bind(user.weight_kg)
  .bind(user.goal.to_string())
  .bind(user.activity.to_string())
  .bind(user.kcal_target)
  .execute(executor)
  .await?;
  Ok(())
}

/// Returns the new row id
async fn insert_entry<'e, E: SqliteExecutor<'e>>(
  executor: E,
  entry: &NewEntry,
) -> Result<i64, StoreError> {
  let result = sqlx::query(
    r#"
    INSERT INTO entries (day_iso, meal, name, kcal, origin, qty)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#,
  )
  .bind(day_iso(entry.day))
  .bind(entry.meal.as_str())
  .bind(&entry.name)
  .bind(entry.kcal)
  .bind(entry.origin.to_string())
  .bind(entry.qty)
  .execute(executor)
  .await?;
  Ok(result.last_insert_rowid())
}

async fn insert_food<'e, E: SqliteExecutor<'e>>(
  executor: E,
  food: &NewFood,
) -> Result<(), StoreError> {
  let tags_json = serde_json::to_string(&food.tags)
    .map_err(|e| StoreError::Corrupt(format!("food tags: {}", e)))?;
  sqlx::query(
    r#"
    INSERT INTO foods (name, base_portion, kcal_per_portion, tags_json)
    VALUES (?1, ?2, ?3, ?4)
    "#,
  )
  .bind(&food.name)
  .bind(&food.base_portion)
  .bind(food.kcal_per_portion)
  .bind(tags_json)
  .execute(executor)
  .await?;
  Ok(())
}

async fn upsert_settings<'e, E: SqliteExecutor<'e>>(
  executor: E,
  settings: &Settings,
) -> Result<(), StoreError> {
  let slots_json = serde_json::to_string(&settings.meal_slots)
    .map_err(|e| StoreError::Corrupt(format!("meal slots: {}", e)))?;

  sqlx::query(
    r#"
    INSERT INTO settings (
      id, meal_slots_json, breakfast_time, lunch_time, snack_time, dinner_time,
      pro_active, adjustments_today, last_reset_date, consent_notifications
    )
    VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT(id) DO UPDATE SET
      meal_slots_json = excluded.meal_slots_json,
      breakfast_time = excluded.breakfast_time,
      lunch_time = excluded.lunch_time,
      snack_time = excluded.snack_time,
      dinner_time = excluded.dinner_time,
      pro_active = excluded.pro_active,
      adjustments_today = excluded.adjustments_today,
      last_reset_date = excluded.last_reset_date,
      consent_notifications = excluded.consent_notifications,
      updated_at = CURRENT_TIMESTAMP
    "#,
  )
  .bind(slots_json)
  .bind(format_clock(settings.meal_times.breakfast))
  .bind(format_clock(settings.meal_times.lunch))
  .bind(format_clock(settings.meal_times.snack))
  .bind(format_clock(settings.meal_times.dinner))
  .bind(settings.pro_active)
  .bind(i64::from(settings.quota.adjustments_today))
  .bind(settings.quota.last_reset_date.map(day_iso))
  .bind(settings.consent_notifications)
  .execute(executor)
  .await?;
  Ok(())
}

// ---------------------------------------------------------------------------
// MealStore
// ---------------------------------------------------------------------------

#[async_trait]
impl MealStore for SqliteStore {
  async fn get_user(&self) -> Result<Option<UserProfile>, StoreError> {
    let row = sqlx::query(
      r#"
      SELECT sex, age, height_cm, weight_kg, goal, activity, kcal_target
      FROM users
      ORDER BY id DESC
      LIMIT 1
      "#,
    )
    .fetch_optional(&self.pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
  }

  async fn put_user(&self, user: &UserProfile) -> Result<(), StoreError> {
    upsert_user(&self.pool, user).await?;
    debug!(kcal_target = user.kcal_target, "Saved user profile");
    Ok(())
  }

  async fn get_plan(&self, day: NaiveDate) -> Result<Option<DailyPlan>, StoreError> {
    let row = sqlx::query(
      r#"
      SELECT day_iso, breakfast_kcal, lunch_kcal, snack_kcal, dinner_kcal
      FROM plans
      WHERE day_iso = ?1
      "#,
    )
    .bind(day_iso(day))
    .fetch_optional(&self.pool)
    .await?;

    row.as_ref().map(plan_from_row).transpose()
  }

  async fn put_plan(&self, plan: &DailyPlan) -> Result<(), StoreError> {
    upsert_plan(&self.pool, plan).await
  }

  async fn list_plans(&self) -> Result<Vec<DailyPlan>, StoreError> {
    let rows = sqlx::query(
      r#"
      SELECT day_iso, breakfast_kcal, lunch_kcal, snack_kcal, dinner_kcal
      FROM plans
      ORDER BY day_iso DESC
      "#,
    )
    .fetch_all(&self.pool)
    .await?;

    rows.iter().map(plan_from_row).collect()
  }

  async fn get_entries(&self, day: NaiveDate) -> Result<Vec<Entry>, StoreError> {
    let rows = sqlx::query(
      r#"
      SELECT id, day_iso, meal, name, kcal, origin, qty
      FROM entries
      WHERE day_iso = ?1
      ORDER BY id ASC
      "#,
    )
    .bind(day_iso(day))
    .fetch_all(&self.pool)
    .await?;

    rows.iter().map(entry_from_row).collect()
  }

  async fn add_entry(&self, entry: &NewEntry) -> Result<Entry, StoreError> {
    let id = insert_entry(&self.pool, entry).await?;
    Ok(Entry {
      id,
      day: entry.day,
      meal: entry.meal,
      name: entry.name.clone(),
      kcal: entry.kcal,
      origin: entry.origin,
      qty: entry.qty,
    })
  }

  async fn get_food(&self, id: i64) -> Result<Option<Food>, StoreError> {
    let row = sqlx::query(
      "SELECT id, name, base_portion, kcal_per_portion, tags_json FROM foods WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;

    row.as_ref().map(food_from_row).transpose()
  }

  async fn search_foods(&self, query: &str) -> Result<Vec<Food>, StoreError> {
    // Matching happens in Rust: LIKE only folds ASCII case and treats % and _
    // as wildcards
    let rows = sqlx::query(
      r#"
      SELECT id, name, base_portion, kcal_per_portion, tags_json
      FROM foods
      "#,
    )
    .fetch_all(&self.pool)
    .await?;

    let foods = rows.iter().map(food_from_row).collect::<Result<Vec<_>, _>>()?;
    Ok(filter_foods(foods, query))
  }

  async fn add_foods(&self, foods: &[NewFood]) -> Result<usize, StoreError> {
    let mut tx = self.pool.begin().await?;
    for food in foods {
      insert_food(&mut *tx, food).await?;
    }
    tx.commit().await?;
    Ok(foods.len())
  }

  async fn get_settings(&self) -> Result<Settings, StoreError> {
    let row = sqlx::query(
      r#"
      SELECT meal_slots_json, breakfast_time, lunch_time, snack_time, dinner_time,
             pro_active, adjustments_today, last_reset_date, consent_notifications
      FROM settings
      WHERE id = 1
      "#,
    )
    .fetch_optional(&self.pool)
    .await?;

    match row {
      Some(row) => settings_from_row(&row),
      None => Ok(Settings::default()),
    }
  }

  async fn put_settings(&self, settings: &Settings) -> Result<(), StoreError> {
    upsert_settings(&self.pool, settings).await
  }

  async fn commit_adjustment(
    &self,
    plan: &DailyPlan,
    settings: &Settings,
  ) -> Result<(), StoreError> {
    let mut tx = self.pool.begin().await?;
    upsert_plan(&mut *tx, plan).await?;
    upsert_settings(&mut *tx, settings).await?;
    tx.commit().await?;
    Ok(())
  }

  async fn import_batch(&self, batch: &ImportBatch) -> Result<(), StoreError> {
    // Dropping the transaction on error rolls everything back
    let mut tx = self.pool.begin().await?;
    if let Some(user) = &batch.user {
      upsert_user(&mut *tx, user).await?;
    }
    for plan in &batch.plans {
      upsert_plan(&mut *tx, plan).await?;
    }
    for entry in &batch.entries {
      insert_entry(&mut *tx, entry).await?;
    }
    for food in &batch.foods {
      insert_food(&mut *tx, food).await?;
    }
    if let Some(settings) = &batch.settings {
      upsert_settings(&mut *tx, settings).await?;
    }
    tx.commit().await?;
    Ok(())
  }

  async fn is_empty(&self) -> Result<bool, StoreError> {
    let count: i64 = sqlx::query_scalar(
      r#"
      SELECT (SELECT COUNT(*) FROM users)
           + (SELECT COUNT(*) FROM plans)
           + (SELECT COUNT(*) FROM entries)
           + (SELECT COUNT(*) FROM foods)
           + (SELECT COUNT(*) FROM settings)
      "#,
    )
    .fetch_one(&self.pool)
    .await?;
    Ok(count == 0)
  }
}
