//! Local persistence: backend selection, connection lifecycle,
//! repositories, and the aggregation query.
//!
//! Two interchangeable backends sit behind one repository contract: the
//! SQLite engine and a flat key-value emulation for targets without
//! embedded SQL storage. The choice is made once in [`Database::open`] and
//! never revisited; nothing backend-specific leaks past it.

mod aggregate;
mod connection;
mod error;
mod kv;
mod meal_repo;
mod settings_repo;
mod water_repo;

pub use aggregate::{daily_totals, DailyTotals};
pub use connection::Connection;
pub use error::StorageError;
pub use kv::KvStore;
pub use meal_repo::SqliteMealRepository;
pub use settings_repo::SqliteSettingsRepository;
pub use water_repo::SqliteWaterRepository;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::models::{MealRecord, MealType, NutritionPayload, WaterLog};

/// Which storage backend to use. Decided once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Pick the structured engine where available (all current targets).
    #[default]
    Auto,
    Sqlite,
    KeyValue,
}

/// Meal repository, backend-agnostic to callers.
pub enum MealRepository {
    Sqlite(SqliteMealRepository),
    KeyValue(KvStore),
}

impl MealRepository {
    pub async fn add(
        &self,
        date: NaiveDate,
        meal_type: MealType,
        analysis: &NutritionPayload,
        image_base64: Option<String>,
    ) -> Result<i64, StorageError> {
        match self {
            MealRepository::Sqlite(repo) => repo.add(date, meal_type, analysis, image_base64).await,
            MealRepository::KeyValue(store) => {
                store.add_meal(date, meal_type, analysis, image_base64).await
            }
        }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<MealRecord>, StorageError> {
        match self {
            MealRepository::Sqlite(repo) => repo.get_by_id(id).await,
            MealRepository::KeyValue(store) => store.get_meal(id).await,
        }
    }

    pub async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<MealRecord>, StorageError> {
        match self {
            MealRepository::Sqlite(repo) => repo.list_by_date(date).await,
            MealRepository::KeyValue(store) => store.meals_by_date(date).await,
        }
    }

    pub async fn list_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MealRecord>, StorageError> {
        match self {
            MealRepository::Sqlite(repo) => repo.list_range(from, to).await,
            MealRepository::KeyValue(store) => store.meals_in_range(from, to).await,
        }
    }

    pub async fn update_analysis(
        &self,
        id: i64,
        analysis: &NutritionPayload,
    ) -> Result<(), StorageError> {
        match self {
            MealRepository::Sqlite(repo) => repo.update_analysis(id, analysis).await,
            MealRepository::KeyValue(store) => store.update_meal_analysis(id, analysis).await,
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), StorageError> {
        match self {
            MealRepository::Sqlite(repo) => repo.delete(id).await,
            MealRepository::KeyValue(store) => store.delete_meal(id).await,
        }
    }
}

/// Water-intake repository, backend-agnostic to callers.
pub enum WaterRepository {
    Sqlite(SqliteWaterRepository),
    KeyValue(KvStore),
}

impl WaterRepository {
    pub async fn add(&self, date: NaiveDate, amount: i64) -> Result<i64, StorageError> {
        match self {
            WaterRepository::Sqlite(repo) => repo.add(date, amount).await,
            WaterRepository::KeyValue(store) => store.add_water(date, amount).await,
        }
    }

    pub async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<WaterLog>, StorageError> {
        match self {
            WaterRepository::Sqlite(repo) => repo.list_by_date(date).await,
            WaterRepository::KeyValue(store) => store.water_by_date(date).await,
        }
    }

    pub async fn list_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WaterLog>, StorageError> {
        match self {
            WaterRepository::Sqlite(repo) => repo.list_range(from, to).await,
            WaterRepository::KeyValue(store) => store.water_in_range(from, to).await,
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), StorageError> {
        match self {
            WaterRepository::Sqlite(repo) => repo.delete(id).await,
            WaterRepository::KeyValue(store) => store.delete_water(id).await,
        }
    }
}

/// Settings store, backend-agnostic to callers.
pub enum SettingsRepository {
    Sqlite(SqliteSettingsRepository),
    KeyValue(KvStore),
}

impl SettingsRepository {
    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            SettingsRepository::Sqlite(repo) => repo.get(key).await,
            SettingsRepository::KeyValue(store) => store.get_setting(key).await,
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            SettingsRepository::Sqlite(repo) => repo.set(key, value).await,
            SettingsRepository::KeyValue(store) => store.set_setting(key, value).await,
        }
    }
}

/// The opened repository set. One per process.
pub struct Database {
    pub meals: MealRepository,
    pub water: WaterRepository,
    pub settings: SettingsRepository,
}

impl Database {
    /// Opens the backend named by the config and validates it is usable.
    /// There is no automatic fallback between backends once selected.
    pub async fn open(config: &Config) -> Result<Self, StorageError> {
        match config.backend {
            BackendKind::Auto | BackendKind::Sqlite => {
                let conn = Arc::new(Connection::new(config.database_path.clone()));
                // Surface open failures here instead of on the first query.
                conn.acquire().await?;
                Ok(Self {
                    meals: MealRepository::Sqlite(SqliteMealRepository::new(conn.clone())),
                    water: WaterRepository::Sqlite(SqliteWaterRepository::new(conn.clone())),
                    settings: SettingsRepository::Sqlite(SqliteSettingsRepository::new(conn)),
                })
            }
            BackendKind::KeyValue => {
                let store = KvStore::open(&config.data_dir)?;
                Ok(Self {
                    meals: MealRepository::KeyValue(store.clone()),
                    water: WaterRepository::KeyValue(store.clone()),
                    settings: SettingsRepository::KeyValue(store),
                })
            }
        }
    }
}
