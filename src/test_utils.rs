//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - App state over either store
//! - Test fixtures

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::AppState;
use crate::models::{ActivityLevel, DailyPlan, Goal, NewFood, Sex, UserProfile};
use crate::store::{MealStore, MemoryStore, SqliteStore};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  // Run migrations
  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// App state over a fresh [`MemoryStore`]; the store handle is returned too
/// so tests can inject write failures
pub fn memory_state() -> (AppState, Arc<MemoryStore>) {
  let store = Arc::new(MemoryStore::new());
  let state = AppState::new(store.clone(), AppConfig::default());
  (state, store)
}

/// App state over a fresh in-memory SQLite database
pub async fn sqlite_state() -> (AppState, SqlitePool) {
  let pool = setup_test_db().await;
  let state = AppState::new(Arc::new(SqliteStore::new(pool.clone())), AppConfig::default());
  (state, pool)
}

/// Seed a small food catalog
pub async fn seed_test_foods(store: &dyn MealStore) -> usize {
  let foods = vec![
    NewFood {
      name: "Banana".to_string(),
      base_portion: "1 unit".to_string(),
      kcal_per_portion: 89.0,
      tags: vec!["fruit".to_string()],
    },
    NewFood {
      name: "White rice".to_string(),
      base_portion: "100g".to_string(),
      kcal_per_portion: 130.0,
      tags: vec!["grain".to_string()],
    },
    NewFood {
      name: "Whole milk".to_string(),
      base_portion: "200ml".to_string(),
      kcal_per_portion: 122.5,
      tags: vec![],
    },
  ];

  store
    .add_foods(&foods)
    .await
    .expect("Failed to seed foods")
}

/// ---------------------------------------------------------------------------
/// Fixtures
/// ---------------------------------------------------------------------------

/// Fixed day so tests never depend on the wall clock
pub fn test_day() -> NaiveDate {
  NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

/// Local wall-clock time on [`test_day`]
pub fn test_now(hour: u32, minute: u32) -> NaiveDateTime {
  test_day().and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
}

/// Male, 30y, 180cm, 80kg, moderate, maintain: 2759 kcal
pub fn mock_profile() -> UserProfile {
  UserProfile {
    sex: Sex::Male,
    age: 30,
    height_cm: 180.0,
    weight_kg: 80.0,
    goal: Goal::Maintain,
    activity: ActivityLevel::Moderate,
    kcal_target: 2759,
  }
}

/// 400 / 700 / 300 / 600 on [`test_day`]
pub fn mock_plan() -> DailyPlan {
  DailyPlan {
    day: test_day(),
    breakfast_kcal: 400,
    lunch_kcal: 700,
    snack_kcal: 300,
    dinner_kcal: 600,
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    // Verify key tables exist
    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('users', 'plans', 'entries', 'foods', 'settings')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 5, "Expected 5 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_foods_returns_correct_count() {
    let (state, pool) = sqlite_state().await;

    let inserted = seed_test_foods(state.store.as_ref()).await;
    assert_eq!(inserted, 3);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM foods")
      .fetch_one(&pool)
      .await
      .expect("Failed to count foods");

    assert_eq!(count, 3);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_fixtures_are_consistent() {
    assert_eq!(mock_plan().total(), 2000);
    assert_eq!(test_now(15, 0).date(), test_day());
    assert_eq!(
      crate::energy::compute_daily_target(&mock_profile(), &Default::default()),
      mock_profile().kcal_target
    );
  }
}
