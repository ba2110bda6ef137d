use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::AppConfig;
use crate::store::{MealStore, SqliteStore, StoreError};

pub type DbPool = SqlitePool;

/// Application state shared by every command
pub struct AppState {
  pub store: Arc<dyn MealStore>,
  pub config: AppConfig,
  /// Serializes every read-modify-write of the settings row. Apply holds it
  /// from the quota check until the readjusted plan is committed.
  pub(crate) adjust_lock: Mutex<()>,
}

impl AppState {
  pub fn new(store: Arc<dyn MealStore>, config: AppConfig) -> Self {
    Self {
      store,
      config,
      adjust_lock: Mutex::new(()),
    }
  }

  /// Open the configured SQLite database and wrap it in a store
  pub async fn open(config: AppConfig) -> Result<Self, StoreError> {
    let pool = initialize_db(&config.database_url).await?;
    Ok(Self::new(Arc::new(SqliteStore::new(pool)), config))
  }
}

/// File backing a `sqlite://` URL, if it names one
fn get_db_path(database_url: &str) -> Option<PathBuf> {
  let rest = database_url
    .strip_prefix("sqlite://")
    .or_else(|| database_url.strip_prefix("sqlite:"))?;
  let path = rest.split('?').next().unwrap_or_default();
  if path.is_empty() || path.contains(":memory:") {
    return None;
  }
  Some(PathBuf::from(path))
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(database_url: &str) -> Result<DbPool, StoreError> {
  let in_memory = database_url.contains(":memory:");

  if let Some(db_path) = get_db_path(database_url) {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
      // Create directory if it doesn't exist
      fs::create_dir_all(parent)?;
    }
    info!(path = %db_path.display(), "Initializing database");
  } else {
    info!(url = database_url, "Initializing database");
  }

  // Each in-memory connection would be its own empty database
  let pool = SqlitePoolOptions::new()
    .max_connections(if in_memory { 1 } else { 5 })
    .connect(database_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}
