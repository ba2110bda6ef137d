use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::slot::{default_meal_slots, MealKey, MealSlot};
use crate::quota::AdjustmentQuota;

/// Scheduled start time of each canonical meal slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealTimes {
  pub breakfast: NaiveTime,
  pub lunch: NaiveTime,
  pub snack: NaiveTime,
  pub dinner: NaiveTime,
}

impl MealTimes {
  pub fn start_of(&self, key: MealKey) -> NaiveTime {
    match key {
      MealKey::Breakfast => self.breakfast,
      MealKey::Lunch => self.lunch,
      MealKey::Snack => self.snack,
      MealKey::Dinner => self.dinner,
    }
  }
}

impl Default for MealTimes {
  fn default() -> Self {
    Self {
      breakfast: NaiveTime::from_hms_opt(8, 0, 0).expect("valid clock time"),
      lunch: NaiveTime::from_hms_opt(12, 30, 0).expect("valid clock time"),
      snack: NaiveTime::from_hms_opt(16, 0, 0).expect("valid clock time"),
      dinner: NaiveTime::from_hms_opt(19, 30, 0).expect("valid clock time"),
    }
  }
}

/// Parse an "HH:MM" clock time as stored in settings
pub fn parse_clock(value: &str) -> Result<NaiveTime, String> {
  NaiveTime::parse_from_str(value.trim(), "%H:%M")
    .map_err(|e| format!("Invalid clock time '{}': {}", value, e))
}

pub fn format_clock(time: NaiveTime) -> String {
  time.format("%H:%M").to_string()
}

/// Singleton app settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
  pub meal_slots: Vec<MealSlot>,
  pub meal_times: MealTimes,
  /// Entitlement flag from the paywall; entitled users are never quota-gated
  pub pro_active: bool,
  pub quota: AdjustmentQuota,
  pub consent_notifications: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      meal_slots: default_meal_slots(),
      meal_times: MealTimes::default(),
      pro_active: false,
      quota: AdjustmentQuota::default(),
      consent_notifications: false,
    }
  }
}
