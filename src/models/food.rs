use serde::{Deserialize, Serialize};

/// Catalog item the user can pick instead of typing calories by hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
  pub id: i64,
  pub name: String,
  pub base_portion: String,
  pub kcal_per_portion: f64,
  pub tags: Vec<String>,
}

/// For inserting new catalog items (without id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFood {
  pub name: String,
  pub base_portion: String,
  pub kcal_per_portion: f64,
  #[serde(default)]
  pub tags: Vec<String>,
}
