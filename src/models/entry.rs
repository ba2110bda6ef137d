use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::slot::MealKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrigin {
  Catalog,
  Text,
}

impl std::fmt::Display for EntryOrigin {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Catalog => write!(f, "catalog"),
      Self::Text => write!(f, "text"),
    }
  }
}

impl std::str::FromStr for EntryOrigin {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "catalog" => Ok(Self::Catalog),
      "text" => Ok(Self::Text),
      _ => Err(format!("Unknown entry origin: {}", s)),
    }
  }
}

/// One logged food item. Entries are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
  pub id: i64,
  pub day: NaiveDate,
  pub meal: MealKey,
  pub name: String,
  pub kcal: i64,
  pub origin: EntryOrigin,
  pub qty: Option<f64>,
}

/// For inserting new entries (without id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
  pub day: NaiveDate,
  pub meal: MealKey,
  pub name: String,
  pub kcal: i64,
  pub origin: EntryOrigin,
  pub qty: Option<f64>,
}
