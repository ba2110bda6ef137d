//! Legacy record migration
//!
//! Version 0 records come from the earlier browser build. Their field names
//! are camelCase or Portuguese (`idade`, `cafe_kcal`, `refeicao`, ...) and
//! some enum values are localized. [`migrate_record`] lifts one record to
//! the current schema, which is exactly the serde shape of the models.
//! [`import_legacy`] loads a whole v0 dump into an empty store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{ImportBatch, MealStore, StoreError};
use crate::models::{
  parse_clock, parse_day_iso, ActivityLevel, DailyPlan, EntryOrigin, Goal, MealKey, MealTimes,
  NewEntry, NewFood, Settings, Sex, UserProfile,
};
use crate::quota::AdjustmentQuota;

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
  User,
  Plan,
  Entry,
  Food,
  Settings,
}

impl std::fmt::Display for RecordKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::User => write!(f, "user"),
      Self::Plan => write!(f, "plan"),
      Self::Entry => write!(f, "entry"),
      Self::Food => write!(f, "food"),
      Self::Settings => write!(f, "settings"),
    }
  }
}

#[derive(Debug, thiserror::Error, Serialize, PartialEq)]
#[serde(tag = "type", content = "message")]
pub enum MigrationError {
  #[error("Unsupported record version: {0}")]
  UnsupportedVersion(u32),

  #[error("Expected a JSON object for {0} record")]
  NotAnObject(RecordKind),

  #[error("{kind} record is missing '{field}'")]
  MissingField {
    kind: RecordKind,
    field: &'static str,
  },

  #[error("Invalid {kind} record: {message}")]
  Invalid { kind: RecordKind, message: String },

  #[error("Malformed legacy dump: {0}")]
  Decode(String),

  #[error("Import failed: {0}")]
  Store(String),
}

impl From<serde_json::Error> for MigrationError {
  fn from(err: serde_json::Error) -> Self {
    MigrationError::Decode(err.to_string())
  }
}

impl From<StoreError> for MigrationError {
  fn from(err: StoreError) -> Self {
    MigrationError::Store(err.to_string())
  }
}

/// Lift `record` from `from_version` to [`CURRENT_VERSION`]
pub fn migrate_record(
  kind: RecordKind,
  record: Value,
  from_version: u32,
) -> Result<Value, MigrationError> {
  match from_version {
    CURRENT_VERSION => Ok(record),
    0 => {
      let obj = record
        .as_object()
        .ok_or(MigrationError::NotAnObject(kind))?;
      let lifted = match kind {
        RecordKind::User => serde_json::to_value(user_v0(obj)?)?,
        RecordKind::Plan => serde_json::to_value(plan_v0(obj)?)?,
        RecordKind::Entry => serde_json::to_value(entry_v0(obj)?)?,
        RecordKind::Food => serde_json::to_value(food_v0(obj)?)?,
        RecordKind::Settings => serde_json::to_value(settings_v0(obj)?)?,
      };
      Ok(lifted)
    }
    other => Err(MigrationError::UnsupportedVersion(other)),
  }
}

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

type Record = Map<String, Value>;

/// First of `names` present with a non-null value
fn field<'a>(obj: &'a Record, names: &[&str]) -> Option<&'a Value> {
  names
    .iter()
    .filter_map(|name| obj.get(*name))
    .find(|v| !v.is_null())
}

fn text(obj: &Record, names: &[&str]) -> Option<String> {
  field(obj, names).and_then(|v| match v {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  })
}

/// Numbers may have been stored as strings by old form inputs
fn number(obj: &Record, kind: RecordKind, names: &[&str]) -> Result<Option<f64>, MigrationError> {
  let Some(value) = field(obj, names) else {
    return Ok(None);
  };
  let parsed = match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  };
  match parsed {
    Some(v) if v.is_finite() => Ok(Some(v)),
    _ => Err(MigrationError::Invalid {
      kind,
      message: format!("'{}' is not a number: {}", names[0], value),
    }),
  }
}

fn flag(obj: &Record, names: &[&str]) -> bool {
  match field(obj, names) {
    Some(Value::Bool(b)) => *b,
    Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
    _ => false,
  }
}

fn kcal(obj: &Record, kind: RecordKind, names: &[&str]) -> Result<i64, MigrationError> {
  Ok(number(obj, kind, names)?.map_or(0, |v| (v.round() as i64).max(0)))
}

fn required_day(
  obj: &Record,
  kind: RecordKind,
  names: &[&str],
) -> Result<chrono::NaiveDate, MigrationError> {
  let value = text(obj, names).ok_or(MigrationError::MissingField {
    kind,
    field: "day",
  })?;
  parse_day_iso(&value).map_err(|message| MigrationError::Invalid { kind, message })
}

fn invalid(kind: RecordKind, what: &str, value: &str) -> MigrationError {
  MigrationError::Invalid {
    kind,
    message: format!("unknown {} '{}'", what, value),
  }
}

// ---------------------------------------------------------------------------
// Per-kind mapping
// ---------------------------------------------------------------------------

fn user_v0(obj: &Record) -> Result<UserProfile, MigrationError> {
  let kind = RecordKind::User;

  let sex = match text(obj, &["sex", "sexo"]) {
    None => Sex::Male,
    Some(raw) => match raw.trim().to_lowercase().as_str() {
      "m" | "male" | "masculino" => Sex::Male,
      "f" | "female" | "feminino" => Sex::Female,
      "other" | "outro" => Sex::Other,
      _ => return Err(invalid(kind, "sex", &raw)),
    },
  };

  let goal = match text(obj, &["goal", "objetivo"]) {
    None => Goal::Maintain,
    Some(raw) => match raw.trim().to_lowercase().as_str() {
      "lose" | "perder" => Goal::Lose,
      "maintain" | "manter" => Goal::Maintain,
      "gain" | "ganhar" => Goal::Gain,
      _ => return Err(invalid(kind, "goal", &raw)),
    },
  };

  let activity = match text(obj, &["activity", "atividade"]) {
    None => ActivityLevel::Light,
    Some(raw) => match raw.trim().to_lowercase().as_str() {
      "sedentary" | "sedentário" | "sedentario" => ActivityLevel::Sedentary,
      "light" | "leve" => ActivityLevel::Light,
      "moderate" | "moderado" => ActivityLevel::Moderate,
      "intense" | "intenso" => ActivityLevel::Intense,
      _ => return Err(invalid(kind, "activity", &raw)),
    },
  };

  let age = number(obj, kind, &["age", "idade"])?
    .ok_or(MigrationError::MissingField { kind, field: "age" })?;
  let height_cm = number(obj, kind, &["heightCm", "altura_cm"])?
    .ok_or(MigrationError::MissingField { kind, field: "height_cm" })?;
  let weight_kg = number(obj, kind, &["weightKg", "peso_kg"])?
    .ok_or(MigrationError::MissingField { kind, field: "weight_kg" })?;

  Ok(UserProfile {
    sex,
    age: age.round().clamp(0.0, u32::MAX as f64) as u32,
    height_cm,
    weight_kg,
    goal,
    activity,
    kcal_target: kcal(obj, kind, &["kcalTarget", "meta_kcal"])?,
  })
}

fn plan_v0(obj: &Record) -> Result<DailyPlan, MigrationError> {
  let kind = RecordKind::Plan;
  Ok(DailyPlan {
    day: required_day(obj, kind, &["dayIso", "dia_iso", "dia", "day"])?,
    breakfast_kcal: kcal(obj, kind, &["breakfastKcal", "cafe_kcal", "cafe"])?,
    lunch_kcal: kcal(obj, kind, &["lunchKcal", "almoco_kcal", "almoco"])?,
    snack_kcal: kcal(obj, kind, &["snackKcal", "lanche_kcal", "lanche"])?,
    dinner_kcal: kcal(obj, kind, &["dinnerKcal", "jantar_kcal", "jantar"])?,
  })
}

fn meal_v0(raw: &str) -> Option<MealKey> {
  match raw.trim().to_lowercase().as_str() {
    "breakfast" | "café" | "cafe" => Some(MealKey::Breakfast),
    "lunch" | "almoço" | "almoco" => Some(MealKey::Lunch),
    "snack" | "lanche" => Some(MealKey::Snack),
    "dinner" | "jantar" => Some(MealKey::Dinner),
    _ => None,
  }
}

fn entry_v0(obj: &Record) -> Result<NewEntry, MigrationError> {
  let kind = RecordKind::Entry;

  let meal = match text(obj, &["meal", "refeicao"]) {
    None => MealKey::Breakfast,
    Some(raw) => meal_v0(&raw).ok_or_else(|| invalid(kind, "meal", &raw))?,
  };

  let origin = match text(obj, &["origin", "origem"]) {
    None => EntryOrigin::Text,
    Some(raw) => match raw.trim().to_lowercase().as_str() {
      "catalog" | "catalogo" | "catálogo" => EntryOrigin::Catalog,
      "text" | "texto" => EntryOrigin::Text,
      _ => return Err(invalid(kind, "origin", &raw)),
    },
  };

  Ok(NewEntry {
    day: required_day(obj, kind, &["dayIso", "dia_iso", "dia"])?,
    meal,
    name: text(obj, &["name", "nome"]).unwrap_or_default(),
    kcal: kcal(obj, kind, &["kcal", "calorias"])?,
    origin,
    qty: number(obj, kind, &["qty", "quantidade"])?,
  })
}

fn food_v0(obj: &Record) -> Result<NewFood, MigrationError> {
  let kind = RecordKind::Food;

  let tags = match field(obj, &["tags"]) {
    Some(Value::Array(items)) => items
      .iter()
      .filter_map(|t| t.as_str().map(str::to_string))
      .collect(),
    _ => Vec::new(),
  };

  Ok(NewFood {
    name: text(obj, &["name", "nome"]).unwrap_or_default(),
    base_portion: text(obj, &["basePortion", "porcao_base"]).unwrap_or_else(|| "1 unit".to_string()),
    kcal_per_portion: number(obj, kind, &["kcalPerPortion", "kcal_por_porcao"])?
      .unwrap_or(0.0)
      .max(0.0),
    tags,
  })
}

fn settings_v0(obj: &Record) -> Result<Settings, MigrationError> {
  let kind = RecordKind::Settings;
  let defaults = MealTimes::default();

  let clock = |names: &[&str], fallback| match text(obj, names) {
    Some(raw) => parse_clock(&raw).map_err(|message| MigrationError::Invalid { kind, message }),
    None => Ok(fallback),
  };

  let last_reset_date = match text(obj, &["lastResetDate", "last_reset_date"]) {
    Some(raw) => Some(parse_day_iso(&raw).map_err(|message| MigrationError::Invalid { kind, message })?),
    None => None,
  };

  let adjustments_today = number(obj, kind, &["adjustmentsToday", "ajustes_hoje"])?
    .map_or(0, |v| v.round().clamp(0.0, u32::MAX as f64) as u32);

  Ok(Settings {
    meal_times: MealTimes {
      breakfast: clock(&["breakfastTime", "cafe_hora"], defaults.breakfast)?,
      lunch: clock(&["lunchTime", "almoco_hora"], defaults.lunch)?,
      snack: clock(&["snackTime", "lanche_hora"], defaults.snack)?,
      dinner: clock(&["dinnerTime", "jantar_hora"], defaults.dinner)?,
    },
    pro_active: flag(obj, &["proActive", "pro_ativo"]),
    quota: AdjustmentQuota {
      adjustments_today,
      last_reset_date,
    },
    consent_notifications: flag(obj, &["consentNotifications", "consentimento_notificacoes"]),
    ..Settings::default()
  })
}

// ---------------------------------------------------------------------------
// Dump import
// ---------------------------------------------------------------------------

/// Whole-database export of the earlier build
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyDump {
  #[serde(default)]
  pub version: u32,
  #[serde(default)]
  pub users: Vec<Value>,
  #[serde(default)]
  pub plans: Vec<Value>,
  #[serde(default)]
  pub entries: Vec<Value>,
  #[serde(default)]
  pub foods: Vec<Value>,
  #[serde(default)]
  pub settings: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
  pub imported: bool,
  pub users: usize,
  pub plans: usize,
  pub entries: usize,
  pub foods: usize,
  pub settings: usize,
}

fn lift_all<T: serde::de::DeserializeOwned>(
  kind: RecordKind,
  records: Vec<Value>,
  version: u32,
) -> Result<Vec<T>, MigrationError> {
  records
    .into_iter()
    .map(|record| -> Result<T, MigrationError> {
      let lifted = migrate_record(kind, record, version)?;
      Ok(serde_json::from_value(lifted)?)
    })
    .collect()
}

/// Import a legacy dump. Does nothing unless the store is empty. Every record
/// is migrated first and the result is written in one batch, so a failure
/// anywhere leaves the store empty and the import can be retried.
pub async fn import_legacy(
  store: &dyn MealStore,
  dump: LegacyDump,
) -> Result<ImportReport, MigrationError> {
  if !store.is_empty().await? {
    info!("Store already has data, skipping legacy import");
    return Ok(ImportReport::default());
  }

  let version = dump.version;
  let users: Vec<UserProfile> = lift_all(RecordKind::User, dump.users, version)?;
  let plans: Vec<DailyPlan> = lift_all(RecordKind::Plan, dump.plans, version)?;
  let entries: Vec<NewEntry> = lift_all(RecordKind::Entry, dump.entries, version)?;
  let foods: Vec<NewFood> = lift_all(RecordKind::Food, dump.foods, version)?;
  let settings: Vec<Settings> = lift_all(RecordKind::Settings, dump.settings, version)?;

  if users.len() > 1 || settings.len() > 1 {
    warn!(
      users = users.len(),
      settings = settings.len(),
      "Legacy dump has several singleton rows, keeping the last"
    );
  }

  let batch = ImportBatch {
    user: users.last().cloned(),
    plans,
    entries,
    foods,
    settings: settings.last().cloned(),
  };
  store.import_batch(&batch).await?;

  let report = ImportReport {
    imported: true,
    users: users.len(),
    plans: batch.plans.len(),
    entries: batch.entries.len(),
    foods: batch.foods.len(),
    settings: settings.len(),
  };
  info!(?report, "Imported legacy data");
  Ok(report)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;
  use serde_json::json;

  #[test]
  fn test_portuguese_user_is_lifted() {
    let v1 = migrate_record(
      RecordKind::User,
      json!({
        "sexo": "F",
        "idade": 34,
        "altura_cm": "168",
        "peso_kg": 61.5,
        "objetivo": "Perder",
        "atividade": "Sedentário",
      }),
      0,
    )
    .unwrap();

    let user: UserProfile = serde_json::from_value(v1).unwrap();
    assert_eq!(user.sex, Sex::Female);
    assert_eq!(user.age, 34);
    assert_eq!(user.height_cm, 168.0);
    assert_eq!(user.goal, Goal::Lose);
    assert_eq!(user.activity, ActivityLevel::Sedentary);
    assert_eq!(user.kcal_target, 0);
  }

  #[test]
  fn test_camel_case_user_keeps_defaults() {
    let v1 = migrate_record(
      RecordKind::User,
      json!({ "age": 40, "heightCm": 180, "weightKg": 90, "kcalTarget": 2400 }),
      0,
    )
    .unwrap();
    assert_eq!(v1["sex"], "male");
    assert_eq!(v1["goal"], "maintain");
    assert_eq!(v1["activity"], "light");
    assert_eq!(v1["kcal_target"], 2400);
  }

  #[test]
  fn test_plan_and_entry_field_names() {
    let plan = migrate_record(
      RecordKind::Plan,
      json!({ "dia_iso": "2024-11-03", "cafe_kcal": 380, "almoco": 650.4, "jantar_kcal": 560 }),
      0,
    )
    .unwrap();
    assert_eq!(
      plan,
      json!({
        "day": "2024-11-03",
        "breakfast_kcal": 380,
        "lunch_kcal": 650,
        "snack_kcal": 0,
        "dinner_kcal": 560,
      })
    );

    let entry = migrate_record(
      RecordKind::Entry,
      json!({
        "dia": "2024-11-03",
        "refeicao": "Almoço",
        "nome": "Arroz (2× 100g)",
        "calorias": 260,
        "origem": "Catalog",
        "quantidade": 2,
      }),
      0,
    )
    .unwrap();
    let entry: NewEntry = serde_json::from_value(entry).unwrap();
    assert_eq!(entry.meal, MealKey::Lunch);
    assert_eq!(entry.origin, EntryOrigin::Catalog);
    assert_eq!(entry.qty, Some(2.0));
    assert_eq!(entry.kcal, 260);
  }

  #[test]
  fn test_settings_times_and_quota() {
    let v1 = migrate_record(
      RecordKind::Settings,
      json!({
        "cafe_hora": "07:15",
        "pro_ativo": true,
        "adjustmentsToday": 1,
        "last_reset_date": "2024-11-03",
      }),
      0,
    )
    .unwrap();

    let settings: Settings = serde_json::from_value(v1).unwrap();
    assert_eq!(settings.meal_times.breakfast, parse_clock("07:15").unwrap());
    assert_eq!(settings.meal_times.dinner, MealTimes::default().dinner);
    assert!(settings.pro_active);
    assert_eq!(settings.quota.adjustments_today, 1);
    assert_eq!(settings.meal_slots, crate::models::default_meal_slots());
  }

  #[test]
  fn test_rejects_unknown_versions_and_bad_records() {
    assert_eq!(
      migrate_record(RecordKind::Food, json!({}), 7),
      Err(MigrationError::UnsupportedVersion(7))
    );
    assert_eq!(
      migrate_record(RecordKind::Plan, json!([1, 2]), 0),
      Err(MigrationError::NotAnObject(RecordKind::Plan))
    );
    assert_eq!(
      migrate_record(RecordKind::User, json!({ "idade": 30, "peso_kg": 70 }), 0),
      Err(MigrationError::MissingField {
        kind: RecordKind::User,
        field: "height_cm",
      })
    );
    assert!(matches!(
      migrate_record(RecordKind::Entry, json!({ "dia": "2024-11-03", "refeicao": "Ceia" }), 0),
      Err(MigrationError::Invalid { .. })
    ));
  }

  #[test]
  fn test_current_version_passes_through() {
    let record = json!({ "anything": true });
    assert_eq!(
      migrate_record(RecordKind::Food, record.clone(), CURRENT_VERSION),
      Ok(record)
    );
  }

  fn sample_dump() -> LegacyDump {
    serde_json::from_value(json!({
      "version": 0,
      "users": [{ "sexo": "M", "idade": 30, "altura_cm": 180, "peso_kg": 80, "kcalTarget": 2759 }],
      "plans": [{ "dia_iso": "2024-11-03", "cafe_kcal": 552, "almoco_kcal": 966, "lanche_kcal": 414, "jantar_kcal": 827 }],
      "entries": [
        { "dia_iso": "2024-11-03", "refeicao": "Café", "nome": "Pão", "calorias": 150 },
        { "dia_iso": "2024-11-03", "refeicao": "Jantar", "nome": "Sopa", "calorias": 220 }
      ],
      "foods": [{ "nome": "Banana", "porcao_base": "1 un", "kcal_por_porcao": 89 }],
      "settings": [{ "pro_ativo": false, "adjustmentsToday": 0 }]
    }))
    .unwrap()
  }

  #[tokio::test]
  async fn test_import_into_empty_store() {
    let store = MemoryStore::new();
    let report = import_legacy(&store, sample_dump()).await.unwrap();

    assert!(report.imported);
    assert_eq!(report.entries, 2);
    assert_eq!(store.get_user().await.unwrap().unwrap().kcal_target, 2759);

    let day = parse_day_iso("2024-11-03").unwrap();
    assert_eq!(store.get_plan(day).await.unwrap().unwrap().total(), 2759);
    assert_eq!(store.get_entries(day).await.unwrap().len(), 2);
    assert_eq!(store.search_foods("banana").await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_import_skipped_when_store_has_data() {
    let store = MemoryStore::new();
    store.put_settings(&Settings::default()).await.unwrap();

    let report = import_legacy(&store, sample_dump()).await.unwrap();
    assert!(!report.imported);
    assert_eq!(store.get_user().await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_bad_record_imports_nothing() {
    let store = MemoryStore::new();
    let mut dump = sample_dump();
    dump.entries.push(json!({ "refeicao": "Jantar" }));

    let result = import_legacy(&store, dump).await;
    assert_eq!(
      result,
      Err(MigrationError::MissingField {
        kind: RecordKind::Entry,
        field: "day",
      })
    );
    assert!(store.is_empty().await.unwrap());
  }

  #[tokio::test]
  async fn test_failed_write_imports_nothing_and_can_retry() {
    let store = MemoryStore::new();
    store.fail_writes(true);

    let result = import_legacy(&store, sample_dump()).await;
    assert!(matches!(result, Err(MigrationError::Store(_))));
    assert!(store.is_empty().await.unwrap());

    store.fail_writes(false);
    let report = import_legacy(&store, sample_dump()).await.unwrap();
    assert!(report.imported);
    assert_eq!(report.foods, 1);
    let day = parse_day_iso("2024-11-03").unwrap();
    assert_eq!(store.get_entries(day).await.unwrap().len(), 2);
  }
}
