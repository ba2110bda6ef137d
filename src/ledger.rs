//! Consumption ledger aggregation
//!
//! The ledger itself is append-only storage; this module only sums it per
//! slot and per day and compares it against the plan.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DailyPlan, Entry, MealKey};

/// Total kcal logged across all entries
pub fn total_consumed(entries: &[Entry]) -> i64 {
  entries.iter().map(|e| e.kcal.max(0)).sum()
}

/// Total kcal logged against one meal slot
pub fn consumed_by_meal(entries: &[Entry], meal: MealKey) -> i64 {
  entries
    .iter()
    .filter(|e| e.meal == meal)
    .map(|e| e.kcal.max(0))
    .sum()
}

/// Closeness of intake to goal, 0..=100. A day without a goal scores 0.
pub fn adherence_pct(goal: i64, consumed: i64) -> u8 {
  if goal <= 0 {
    return 0;
  }
  let diff = (goal - consumed).abs() as f64;
  let pct = (100.0 - diff / goal as f64 * 100.0).max(0.0);
  pct.round() as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotProgress {
  pub meal: MealKey,
  pub budget: i64,
  pub consumed: i64,
}

impl SlotProgress {
  pub fn over_budget(&self) -> bool {
    self.consumed > self.budget
  }
}

/// Plan vs. ledger for one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
  pub day: NaiveDate,
  pub goal: i64,
  pub consumed: i64,
  /// Negative when the day's goal has been exceeded
  pub remaining: i64,
  pub slots: Vec<SlotProgress>,
  pub adherence_pct: u8,
}

impl DaySummary {
  /// Summarize `entries` against `plan`. Only `meals` get slot rows, but the
  /// daily total counts every entry.
  pub fn compute(plan: &DailyPlan, entries: &[Entry], meals: &[MealKey]) -> Self {
    let goal = plan.total();
    let consumed = total_consumed(entries);

    let slots = meals
      .iter()
      .map(|meal| SlotProgress {
        meal: *meal,
        budget: plan.budget(*meal),
        consumed: consumed_by_meal(entries, *meal),
      })
      .collect();

    Self {
      day: plan.day,
      goal,
      consumed,
      remaining: goal - consumed,
      slots,
      adherence_pct: adherence_pct(goal, consumed),
    }
  }
}

// ---------------------------------------------------------------------------
// "Ate out" quick picks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickPick {
  pub name: &'static str,
  pub kcal: i64,
}

struct Band {
  max_remaining: i64,
  items: [(&'static str, i64); 3],
}

const BANDS: [Band; 4] = [
  Band {
    max_remaining: 150,
    items: [
      ("Greek yogurt (plain, 100g)", 60),
      ("Apple (medium)", 95),
      ("Carrot sticks (150g)", 60),
    ],
  },
  Band {
    max_remaining: 250,
    items: [
      ("Whole-wheat toast + peanut butter (thin)", 200),
      ("Protein shake (water-based)", 180),
      ("Cottage cheese (150g)", 190),
    ],
  },
  Band {
    max_remaining: 400,
    items: [
      ("Chicken wrap (small)", 350),
      ("Tuna salad (light dressing)", 300),
      ("Omelette (2 eggs + veggies)", 280),
    ],
  },
  Band {
    max_remaining: i64::MAX,
    items: [
      ("Rice + beans + chicken (small plate)", 450),
      ("Pasta + tomato sauce (small bowl)", 500),
      ("Grilled steak + salad", 520),
    ],
  },
];

/// Generic suggestions sized to what is left of the day's budget
pub fn quick_picks(remaining: i64) -> Vec<QuickPick> {
  let band = BANDS
    .iter()
    .find(|b| remaining <= b.max_remaining)
    .unwrap_or(&BANDS[0]);
  band
    .items
    .iter()
    .map(|(name, kcal)| QuickPick {
      name: *name,
      kcal: *kcal,
    })
    .collect()
}
