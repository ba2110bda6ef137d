//! In-process [`MealStore`] used by tests and previews

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::{filter_foods, ImportBatch, MealStore, StoreError};
use crate::models::{DailyPlan, Entry, Food, NewEntry, NewFood, Settings, UserProfile};

#[derive(Default)]
struct Tables {
  user: Option<UserProfile>,
  plans: BTreeMap<NaiveDate, DailyPlan>,
  entries: Vec<Entry>,
  foods: Vec<Food>,
  settings: Option<Settings>,
  next_id: i64,
}

impl Tables {
  fn next_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }

  fn push_entry(&mut self, entry: &NewEntry) -> Entry {
    let saved = Entry {
      id: self.next_id(),
      day: entry.day,
      meal: entry.meal,
      name: entry.name.clone(),
      kcal: entry.kcal,
      origin: entry.origin,
      qty: entry.qty,
    };
    self.entries.push(saved.clone());
    saved
  }

  fn push_food(&mut self, food: &NewFood) {
    let id = self.next_id();
    self.foods.push(Food {
      id,
      name: food.name.clone(),
      base_portion: food.base_portion.clone(),
      kcal_per_portion: food.kcal_per_portion,
      tags: food.tags.clone(),
    });
  }
}

#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
  fail_writes: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Make every subsequent write fail with [`StoreError::Unavailable`]
  pub fn fail_writes(&self, fail: bool) {
    self.fail_writes.store(fail, Ordering::SeqCst);
  }

  fn check_writable(&self) -> Result<(), StoreError> {
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(StoreError::Unavailable("writes disabled".to_string()));
    }
    Ok(())
  }
}

#[async_trait]
impl MealStore for MemoryStore {
  async fn get_user(&self) -> Result<Option<UserProfile>, StoreError> {
    Ok(self.tables.lock().await.user.clone())
  }

  async fn put_user(&self, user: &UserProfile) -> Result<(), StoreError> {
    self.check_writable()?;
    self.tables.lock().await.user = Some(user.clone());
    Ok(())
  }

  async fn get_plan(&self, day: NaiveDate) -> Result<Option<DailyPlan>, StoreError> {
    Ok(self.tables.lock().await.plans.get(&day).cloned())
  }

  async fn put_plan(&self, plan: &DailyPlan) -> Result<(), StoreError> {
    self.check_writable()?;
    self.tables.lock().await.plans.insert(plan.day, plan.clone());
    Ok(())
  }

  async fn list_plans(&self) -> Result<Vec<DailyPlan>, StoreError> {
    Ok(self.tables.lock().await.plans.values().rev().cloned().collect())
  }

  async fn get_entries(&self, day: NaiveDate) -> Result<Vec<Entry>, StoreError> {
    let tables = self.tables.lock().await;
    Ok(tables.entries.iter().filter(|e| e.day == day).cloned().collect())
  }

  async fn add_entry(&self, entry: &NewEntry) -> Result<Entry, StoreError> {
    self.check_writable()?;
    Ok(self.tables.lock().await.push_entry(entry))
  }

  async fn get_food(&self, id: i64) -> Result<Option<Food>, StoreError> {
    let tables = self.tables.lock().await;
    Ok(tables.foods.iter().find(|f| f.id == id).cloned())
  }

  async fn search_foods(&self, query: &str) -> Result<Vec<Food>, StoreError> {
    let tables = self.tables.lock().await;
    Ok(filter_foods(tables.foods.iter().cloned(), query))
  }

  async fn add_foods(&self, foods: &[NewFood]) -> Result<usize, StoreError> {
    self.check_writable()?;
    let mut tables = self.tables.lock().await;
    for food in foods {
      tables.push_food(food);
    }
    Ok(foods.len())
  }

  async fn get_settings(&self) -> Result<Settings, StoreError> {
    Ok(self.tables.lock().await.settings.clone().unwrap_or_default())
  }

  async fn put_settings(&self, settings: &Settings) -> Result<(), StoreError> {
    self.check_writable()?;
    self.tables.lock().await.settings = Some(settings.clone());
    Ok(())
  }

  async fn commit_adjustment(
    &self,
    plan: &DailyPlan,
    settings: &Settings,
  ) -> Result<(), StoreError> {
    self.check_writable()?;
    let mut tables = self.tables.lock().await;
    tables.plans.insert(plan.day, plan.clone());
    tables.settings = Some(settings.clone());
    Ok(())
  }

  async fn import_batch(&self, batch: &ImportBatch) -> Result<(), StoreError> {
    self.check_writable()?;
    let mut tables = self.tables.lock().await;
    if let Some(user) = &batch.user {
      tables.user = Some(user.clone());
    }
    for plan in &batch.plans {
      tables.plans.insert(plan.day, plan.clone());
    }
    for entry in &batch.entries {
      tables.push_entry(entry);
    }
    for food in &batch.foods {
      tables.push_food(food);
    }
    if let Some(settings) = &batch.settings {
      tables.settings = Some(settings.clone());
    }
    Ok(())
  }

  async fn is_empty(&self) -> Result<bool, StoreError> {
    let tables = self.tables.lock().await;
    Ok(tables.user.is_none()
      && tables.plans.is_empty()
      && tables.entries.is_empty()
      && tables.foods.is_empty()
      && tables.settings.is_none())
  }
}
