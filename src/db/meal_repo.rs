use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::Arc;

use super::connection::Connection;
use super::error::StorageError;
use crate::models::{MealRecord, MealType, NutritionPayload};

/// SQLite-backed meal repository.
pub struct SqliteMealRepository {
    conn: Arc<Connection>,
}

#[derive(sqlx::FromRow)]
struct MealRow {
    id: i64,
    date: String,
    meal_type: String,
    data: String,
    image_base64: Option<String>,
    timestamp: i64,
}

impl SqliteMealRepository {
    pub fn new(conn: Arc<Connection>) -> Self {
        Self { conn }
    }

    pub async fn add(
        &self,
        date: NaiveDate,
        meal_type: MealType,
        analysis: &NutritionPayload,
        image_base64: Option<String>,
    ) -> Result<i64, StorageError> {
        // Serialize before touching the database so a malformed payload is
        // rejected without writing anything.
        let data = serde_json::to_string(analysis)?;
        let pool = self.conn.acquire().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO meals (date, meal_type, data, image_base64, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(date.to_string())
        .bind(meal_type.as_str())
        .bind(&data)
        .bind(&image_base64)
        .bind(Utc::now().timestamp_millis())
        .execute(&pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<MealRecord>, StorageError> {
        let pool = self.conn.acquire().await?;

        let row: Option<MealRow> = sqlx::query_as("SELECT * FROM meals WHERE id = ?")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

        row.map(hydrate_meal).transpose()
    }

    pub async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<MealRecord>, StorageError> {
        let pool = self.conn.acquire().await?;

        let rows: Vec<MealRow> = sqlx::query_as("SELECT * FROM meals WHERE date = ?")
            .bind(date.to_string())
            .fetch_all(&pool)
            .await?;

        rows.into_iter().map(hydrate_meal).collect()
    }

    pub async fn list_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MealRecord>, StorageError> {
        let pool = self.conn.acquire().await?;

        let rows: Vec<MealRow> =
            sqlx::query_as("SELECT * FROM meals WHERE date >= ? AND date <= ? ORDER BY date")
                .bind(from.to_string())
                .bind(to.to_string())
                .fetch_all(&pool)
                .await?;

        rows.into_iter().map(hydrate_meal).collect()
    }

    /// Replaces the analysis payload of the identified record.
    ///
    /// Updating a missing id is a silent success, mirroring delete.
    pub async fn update_analysis(
        &self,
        id: i64,
        analysis: &NutritionPayload,
    ) -> Result<(), StorageError> {
        let data = serde_json::to_string(analysis)?;
        let pool = self.conn.acquire().await?;

        sqlx::query("UPDATE meals SET data = ? WHERE id = ?")
            .bind(&data)
            .bind(id)
            .execute(&pool)
            .await?;
        Ok(())
    }

    /// Removes the record permanently. Deleting an already-deleted id does
    /// not raise.
    pub async fn delete(&self, id: i64) -> Result<(), StorageError> {
        let pool = self.conn.acquire().await?;

        sqlx::query("DELETE FROM meals WHERE id = ?")
            .bind(id)
            .execute(&pool)
            .await?;
        Ok(())
    }
}

fn hydrate_meal(row: MealRow) -> Result<MealRecord, StorageError> {
    let analysis: NutritionPayload = serde_json::from_str(&row.data)?;
    let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
        .map_err(|e| StorageError::Unavailable(format!("bad date '{}': {}", row.date, e)))?;
    let meal_type: MealType = row
        .meal_type
        .parse()
        .map_err(StorageError::Unavailable)?;
    let timestamp = Utc
        .timestamp_millis_opt(row.timestamp)
        .single()
        .unwrap_or_else(Utc::now);

    Ok(MealRecord {
        id: row.id,
        date,
        meal_type,
        analysis,
        image_base64: row.image_base64,
        timestamp,
    })
}
