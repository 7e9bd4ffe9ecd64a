//! Flat key-value persistence fallback.
//!
//! Emulates the structured backend with one JSON-encoded list per entity
//! type (`meals.json`, `water_logs.json`) plus a `settings.json` map, for
//! targets without embedded SQL storage. Everything is held in memory and
//! rewritten to disk after each mutation.

use chrono::{NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::error::StorageError;
use crate::models::{MealRecord, MealType, NutritionPayload, WaterLog};

const MEALS_FILE: &str = "meals.json";
const WATER_FILE: &str = "water_logs.json";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Default)]
struct KvData {
    meals: Vec<MealRecord>,
    water: Vec<WaterLog>,
    settings: BTreeMap<String, String>,
    // Highest ids ever issued, so ids stay strictly increasing and are
    // never reused after a delete.
    last_meal_id: i64,
    last_water_id: i64,
}

/// Key-value backend shared by the meal, water, and settings repositories.
#[derive(Clone)]
pub struct KvStore {
    dir: PathBuf,
    data: Arc<Mutex<KvData>>,
}

impl KvStore {
    /// Opens the store, loading any existing entity lists from `dir`.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| StorageError::Unavailable(format!("{}: {}", dir.display(), e)))?;

        let meals: Vec<MealRecord> = load_list(&dir.join(MEALS_FILE))?;
        let water: Vec<WaterLog> = load_list(&dir.join(WATER_FILE))?;
        let settings: BTreeMap<String, String> = load_list(&dir.join(SETTINGS_FILE))?;

        let last_meal_id = meals.iter().map(|m| m.id).max().unwrap_or(0);
        let last_water_id = water.iter().map(|w| w.id).max().unwrap_or(0);

        Ok(Self {
            dir: dir.to_path_buf(),
            data: Arc::new(Mutex::new(KvData {
                meals,
                water,
                settings,
                last_meal_id,
                last_water_id,
            })),
        })
    }

    pub async fn add_meal(
        &self,
        date: NaiveDate,
        meal_type: MealType,
        analysis: &NutritionPayload,
        image_base64: Option<String>,
    ) -> Result<i64, StorageError> {
        // Reject unserializable payloads before mutating anything.
        serde_json::to_string(analysis)?;

        let mut data = self.lock();
        let id = next_id(&mut data.last_meal_id);
        data.meals.push(MealRecord {
            id,
            date,
            meal_type,
            analysis: analysis.clone(),
            image_base64,
            timestamp: Utc::now(),
        });
        save_list(&self.dir.join(MEALS_FILE), &data.meals)?;
        Ok(id)
    }

    pub async fn get_meal(&self, id: i64) -> Result<Option<MealRecord>, StorageError> {
        let data = self.lock();
        Ok(data.meals.iter().find(|m| m.id == id).cloned())
    }

    pub async fn meals_by_date(&self, date: NaiveDate) -> Result<Vec<MealRecord>, StorageError> {
        let data = self.lock();
        Ok(data
            .meals
            .iter()
            .filter(|m| m.date == date)
            .cloned()
            .collect())
    }

    pub async fn meals_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MealRecord>, StorageError> {
        let data = self.lock();
        Ok(data
            .meals
            .iter()
            .filter(|m| m.date >= from && m.date <= to)
            .cloned()
            .collect())
    }

    pub async fn update_meal_analysis(
        &self,
        id: i64,
        analysis: &NutritionPayload,
    ) -> Result<(), StorageError> {
        serde_json::to_string(analysis)?;

        let mut data = self.lock();
        // A missing id is a silent success, same as the structured backend.
        if let Some(pos) = data.meals.iter().position(|m| m.id == id) {
            data.meals[pos].analysis = analysis.clone();
            save_list(&self.dir.join(MEALS_FILE), &data.meals)?;
        }
        Ok(())
    }

    pub async fn delete_meal(&self, id: i64) -> Result<(), StorageError> {
        let mut data = self.lock();
        let before = data.meals.len();
        data.meals.retain(|m| m.id != id);
        if data.meals.len() != before {
            save_list(&self.dir.join(MEALS_FILE), &data.meals)?;
        }
        Ok(())
    }

    pub async fn add_water(&self, date: NaiveDate, amount: i64) -> Result<i64, StorageError> {
        super::water_repo::validate_amount(amount)?;
        let mut data = self.lock();
        let id = next_id(&mut data.last_water_id);
        data.water.push(WaterLog {
            id,
            date,
            amount,
            timestamp: Utc::now(),
        });
        save_list(&self.dir.join(WATER_FILE), &data.water)?;
        Ok(id)
    }

    pub async fn water_by_date(&self, date: NaiveDate) -> Result<Vec<WaterLog>, StorageError> {
        let data = self.lock();
        Ok(data
            .water
            .iter()
            .filter(|w| w.date == date)
            .cloned()
            .collect())
    }

    pub async fn water_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WaterLog>, StorageError> {
        let data = self.lock();
        Ok(data
            .water
            .iter()
            .filter(|w| w.date >= from && w.date <= to)
            .cloned()
            .collect())
    }

    pub async fn delete_water(&self, id: i64) -> Result<(), StorageError> {
        let mut data = self.lock();
        let before = data.water.len();
        data.water.retain(|w| w.id != id);
        if data.water.len() != before {
            save_list(&self.dir.join(WATER_FILE), &data.water)?;
        }
        Ok(())
    }

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, StorageError> {
        let data = self.lock();
        Ok(data.settings.get(key).cloned())
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut data = self.lock();
        data.settings.insert(key.to_string(), value.to_string());
        save_list(&self.dir.join(SETTINGS_FILE), &data.settings)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, KvData> {
        self.data.lock().expect("kv store lock poisoned")
    }
}

/// Ids are the current epoch milliseconds, bumped past the highest id ever
/// seen. Strictly increasing within a session and across restarts; never
/// reused after deletion.
fn next_id(last: &mut i64) -> i64 {
    let id = Utc::now().timestamp_millis().max(*last + 1);
    *last = id;
    id
}

fn load_list<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StorageError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| StorageError::Unavailable(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| StorageError::Unavailable(format!("{}: {}", path.display(), e)))
}

fn save_list<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let contents = serde_json::to_string(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)
        .and_then(|_| std::fs::rename(&tmp, path))
        .map_err(|e| StorageError::Unavailable(format!("{}: {}", path.display(), e)))
}
