//! Repository boundary
//!
//! The engine never talks to the database directly. Everything it needs is
//! behind [`MealStore`] so the same commands run against SQLite on device and
//! against [`MemoryStore`] in tests.

pub mod legacy;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{DailyPlan, Entry, Food, NewEntry, NewFood, Settings, UserProfile};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration failed: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("Failed to prepare database location: {0}")]
  Io(#[from] std::io::Error),

  #[error("Corrupt record: {0}")]
  Corrupt(String),

  #[error("Store unavailable: {0}")]
  Unavailable(String),
}

/// ---------------------------------------------------------------------------
/// Repository
/// ---------------------------------------------------------------------------

/// Everything a legacy import writes, applied all at once
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportBatch {
  pub user: Option<UserProfile>,
  pub plans: Vec<DailyPlan>,
  pub entries: Vec<NewEntry>,
  pub foods: Vec<NewFood>,
  pub settings: Option<Settings>,
}

/// Unicode case-insensitive substring match on the name, sorted by name.
/// The query is matched literally.
pub(crate) fn filter_foods(foods: impl IntoIterator<Item = Food>, query: &str) -> Vec<Food> {
  let needle = query.trim().to_lowercase();
  let mut hits: Vec<Food> = foods
    .into_iter()
    .filter(|f| f.name.to_lowercase().contains(&needle))
    .collect();
  hits.sort_by(|a, b| a.name.cmp(&b.name));
  hits
}

#[async_trait]
pub trait MealStore: Send + Sync {
  async fn get_user(&self) -> Result<Option<UserProfile>, StoreError>;

  async fn put_user(&self, user: &UserProfile) -> Result<(), StoreError>;

  async fn get_plan(&self, day: NaiveDate) -> Result<Option<DailyPlan>, StoreError>;

  /// Insert or replace the plan for `plan.day`; there is never more than one
  async fn put_plan(&self, plan: &DailyPlan) -> Result<(), StoreError>;

  /// All plans, most recent day first
  async fn list_plans(&self) -> Result<Vec<DailyPlan>, StoreError>;

  async fn get_entries(&self, day: NaiveDate) -> Result<Vec<Entry>, StoreError>;

  async fn add_entry(&self, entry: &NewEntry) -> Result<Entry, StoreError>;

  async fn get_food(&self, id: i64) -> Result<Option<Food>, StoreError>;

  /// Case-insensitive substring match on the name; empty query lists all
  async fn search_foods(&self, query: &str) -> Result<Vec<Food>, StoreError>;

  async fn add_foods(&self, foods: &[NewFood]) -> Result<usize, StoreError>;

  /// Stored settings, or defaults when none were saved yet
  async fn get_settings(&self) -> Result<Settings, StoreError>;

  async fn put_settings(&self, settings: &Settings) -> Result<(), StoreError>;

  /// Persist a readjusted plan together with the settings carrying the
  /// incremented quota
  async fn commit_adjustment(
    &self,
    plan: &DailyPlan,
    settings: &Settings,
  ) -> Result<(), StoreError> {
    self.put_plan(plan).await?;
    self.put_settings(settings).await
  }

  /// Write the whole batch or nothing
  async fn import_batch(&self, batch: &ImportBatch) -> Result<(), StoreError>;

  /// True when nothing at all has been stored
  async fn is_empty(&self) -> Result<bool, StoreError>;
}
