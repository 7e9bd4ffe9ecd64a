use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::Arc;

use super::connection::Connection;
use super::error::StorageError;
use crate::models::WaterLog;

/// SQLite-backed water-intake repository. Structurally parallel to the meal
/// repository but simpler: no update, no payload.
pub struct SqliteWaterRepository {
    conn: Arc<Connection>,
}

#[derive(sqlx::FromRow)]
struct WaterRow {
    id: i64,
    date: String,
    amount: i64,
    timestamp: i64,
}

impl SqliteWaterRepository {
    pub fn new(conn: Arc<Connection>) -> Self {
        Self { conn }
    }

    pub async fn add(&self, date: NaiveDate, amount: i64) -> Result<i64, StorageError> {
        validate_amount(amount)?;
        let pool = self.conn.acquire().await?;

        let result = sqlx::query("INSERT INTO water_logs (date, amount, timestamp) VALUES (?, ?, ?)")
            .bind(date.to_string())
            .bind(amount)
            .bind(Utc::now().timestamp_millis())
            .execute(&pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<WaterLog>, StorageError> {
        let pool = self.conn.acquire().await?;

        let rows: Vec<WaterRow> = sqlx::query_as("SELECT * FROM water_logs WHERE date = ?")
            .bind(date.to_string())
            .fetch_all(&pool)
            .await?;

        rows.into_iter().map(hydrate_water).collect()
    }

    pub async fn list_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WaterLog>, StorageError> {
        let pool = self.conn.acquire().await?;

        let rows: Vec<WaterRow> =
            sqlx::query_as("SELECT * FROM water_logs WHERE date >= ? AND date <= ? ORDER BY date")
                .bind(from.to_string())
                .bind(to.to_string())
                .fetch_all(&pool)
                .await?;

        rows.into_iter().map(hydrate_water).collect()
    }

    pub async fn delete(&self, id: i64) -> Result<(), StorageError> {
        let pool = self.conn.acquire().await?;

        sqlx::query("DELETE FROM water_logs WHERE id = ?")
            .bind(id)
            .execute(&pool)
            .await?;
        Ok(())
    }
}

pub(super) fn validate_amount(amount: i64) -> Result<(), StorageError> {
    if amount <= 0 {
        return Err(StorageError::InvalidInput(format!(
            "water amount must be a positive number of milliliters, got {}",
            amount
        )));
    }
    Ok(())
}

fn hydrate_water(row: WaterRow) -> Result<WaterLog, StorageError> {
    let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
        .map_err(|e| StorageError::Unavailable(format!("bad date '{}': {}", row.date, e)))?;
    let timestamp = Utc
        .timestamp_millis_opt(row.timestamp)
        .single()
        .unwrap_or_else(Utc::now);

    Ok(WaterLog {
        id: row.id,
        date,
        amount: row.amount,
        timestamp,
    })
}
