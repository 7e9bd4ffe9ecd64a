use std::sync::Arc;

use super::connection::Connection;
use super::error::StorageError;

/// Flat string key/value store with last-write-wins semantics. Holds the
/// analysis API key and user-configured macro targets.
pub struct SqliteSettingsRepository {
    conn: Arc<Connection>,
}

impl SqliteSettingsRepository {
    pub fn new(conn: Arc<Connection>) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let pool = self.conn.acquire().await?;

        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&pool)
            .await?;

        Ok(row.map(|r| r.0))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let pool = self.conn.acquire().await?;

        sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup() -> (SqliteSettingsRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let conn = Arc::new(Connection::new(temp_dir.path().join("test.db")));
        (SqliteSettingsRepository::new(conn), temp_dir)
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (repo, _dir) = setup().await;
        assert_eq!(repo.get("api_key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (repo, _dir) = setup().await;
        repo.set("calorie_target", "2200").await.unwrap();
        assert_eq!(
            repo.get("calorie_target").await.unwrap(),
            Some("2200".to_string())
        );
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let (repo, _dir) = setup().await;
        repo.set("api_key", "old").await.unwrap();
        repo.set("api_key", "new").await.unwrap();
        assert_eq!(repo.get("api_key").await.unwrap(), Some("new".to_string()));
    }
}
