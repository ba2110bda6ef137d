use serde::{Deserialize, Serialize};

/// Canonical meal slots, declared in the order they occur during the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealKey {
  Breakfast,
  Lunch,
  Snack,
  Dinner,
}

impl MealKey {
  pub const ALL: [MealKey; 4] = [
    MealKey::Breakfast,
    MealKey::Lunch,
    MealKey::Snack,
    MealKey::Dinner,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Breakfast => "breakfast",
      Self::Lunch => "lunch",
      Self::Snack => "snack",
      Self::Dinner => "dinner",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Breakfast => "Breakfast",
      Self::Lunch => "Lunch",
      Self::Snack => "Snack",
      Self::Dinner => "Dinner",
    }
  }
}

impl std::fmt::Display for MealKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for MealKey {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "breakfast" => Ok(Self::Breakfast),
      "lunch" => Ok(Self::Lunch),
      "snack" => Ok(Self::Snack),
      "dinner" => Ok(Self::Dinner),
      _ => Err(format!("Unknown meal slot: {}", s)),
    }
  }
}

/// A named share of the day's budget. `percent` is a fraction in 0..=1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSlot {
  pub key: MealKey,
  pub label: String,
  pub percent: f64,
}

impl MealSlot {
  pub fn new(key: MealKey, percent: f64) -> Self {
    Self {
      key,
      label: key.label().to_string(),
      percent,
    }
  }
}

/// Four-slot split used until the user edits the plan-setup screen
pub fn default_meal_slots() -> Vec<MealSlot> {
  vec![
    MealSlot::new(MealKey::Breakfast, 0.20),
    MealSlot::new(MealKey::Lunch, 0.35),
    MealSlot::new(MealKey::Snack, 0.15),
    MealSlot::new(MealKey::Dinner, 0.30),
  ]
}
