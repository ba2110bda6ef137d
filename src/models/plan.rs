use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::slot::MealKey;

/// Format a local calendar day the way it is keyed in storage (YYYY-MM-DD)
pub fn day_iso(day: NaiveDate) -> String {
  day.format("%Y-%m-%d").to_string()
}

pub fn parse_day_iso(value: &str) -> Result<NaiveDate, String> {
  NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
    .map_err(|e| format!("Invalid day '{}': {}", value, e))
}

/// Per-slot calorie budgets for one local day. At most one per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPlan {
  pub day: NaiveDate,
  pub breakfast_kcal: i64,
  pub lunch_kcal: i64,
  pub snack_kcal: i64,
  pub dinner_kcal: i64,
}

impl DailyPlan {
  pub fn empty(day: NaiveDate) -> Self {
    Self {
      day,
      breakfast_kcal: 0,
      lunch_kcal: 0,
      snack_kcal: 0,
      dinner_kcal: 0,
    }
  }

  /// Build a plan from allocated budgets; slots missing from the map hold 0
  pub fn from_budgets(day: NaiveDate, budgets: &BTreeMap<MealKey, i64>) -> Self {
    let mut plan = Self::empty(day);
    for (key, kcal) in budgets {
      plan.set_budget(*key, *kcal);
    }
    plan
  }

  pub fn budget(&self, key: MealKey) -> i64 {
    match key {
      MealKey::Breakfast => self.breakfast_kcal,
      MealKey::Lunch => self.lunch_kcal,
      MealKey::Snack => self.snack_kcal,
      MealKey::Dinner => self.dinner_kcal,
    }
  }

  pub fn set_budget(&mut self, key: MealKey, kcal: i64) {
    let slot = match key {
      MealKey::Breakfast => &mut self.breakfast_kcal,
      MealKey::Lunch => &mut self.lunch_kcal,
      MealKey::Snack => &mut self.snack_kcal,
      MealKey::Dinner => &mut self.dinner_kcal,
    };
    *slot = kcal;
  }

  /// Daily goal: the sum of every slot budget
  pub fn total(&self) -> i64 {
    MealKey::ALL.iter().map(|k| self.budget(*k)).sum()
  }

  pub fn budgets(&self) -> BTreeMap<MealKey, i64> {
    MealKey::ALL.iter().map(|k| (*k, self.budget(*k))).collect()
  }

  pub fn day_iso(&self) -> String {
    day_iso(self.day)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
  }

  #[test]
  fn test_from_budgets_fills_missing_slots_with_zero() {
    let budgets = BTreeMap::from([(MealKey::Breakfast, 600), (MealKey::Dinner, 900)]);
    let plan = DailyPlan::from_budgets(day(), &budgets);

    assert_eq!(plan.breakfast_kcal, 600);
    assert_eq!(plan.lunch_kcal, 0);
    assert_eq!(plan.snack_kcal, 0);
    assert_eq!(plan.dinner_kcal, 900);
    assert_eq!(plan.total(), 1500);
  }

  #[test]
  fn test_day_iso_format() {
    assert_eq!(day_iso(day()), "2025-03-14");
    assert_eq!(parse_day_iso("2025-03-14"), Ok(day()));
    assert!(parse_day_iso("14/03/2025").is_err());
  }
}
