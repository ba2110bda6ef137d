use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
  Male,
  Female,
  Other,
}

/// Activity tiers, ordered from least to most active
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
  Sedentary,
  Light,
  Moderate,
  Intense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
  Lose,
  Maintain,
  Gain,
}

impl std::fmt::Display for Sex {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Male => write!(f, "male"),
      Self::Female => write!(f, "female"),
      Self::Other => write!(f, "other"),
    }
  }
}

impl std::str::FromStr for Sex {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "male" | "m" => Ok(Self::Male),
      "female" | "f" => Ok(Self::Female),
      "other" => Ok(Self::Other),
      _ => Err(format!("Unknown sex: {}", s)),
    }
  }
}

impl std::fmt::Display for ActivityLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Sedentary => write!(f, "sedentary"),
      Self::Light => write!(f, "light"),
      Self::Moderate => write!(f, "moderate"),
      Self::Intense => write!(f, "intense"),
    }
  }
}

impl std::str::FromStr for ActivityLevel {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "sedentary" => Ok(Self::Sedentary),
      "light" => Ok(Self::Light),
      "moderate" => Ok(Self::Moderate),
      "intense" => Ok(Self::Intense),
      _ => Err(format!("Unknown activity level: {}", s)),
    }
  }
}

impl std::fmt::Display for Goal {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Lose => write!(f, "lose"),
      Self::Maintain => write!(f, "maintain"),
      Self::Gain => write!(f, "gain"),
    }
  }
}

impl std::str::FromStr for Goal {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "lose" => Ok(Self::Lose),
      "maintain" => Ok(Self::Maintain),
      "gain" => Ok(Self::Gain),
      _ => Err(format!("Unknown goal: {}", s)),
    }
  }
}

/// Physical profile captured during onboarding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  pub sex: Sex,
  pub age: u32,
  pub height_cm: f64,
  pub weight_kg: f64,
  pub goal: Goal,
  pub activity: ActivityLevel,
  /// Daily target computed from the fields above
  pub kcal_target: i64,
}
