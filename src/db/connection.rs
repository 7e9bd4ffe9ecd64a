//! Lifecycle management for the SQLite handle.
//!
//! The pool is created lazily on first use. Callers that arrive while an
//! open is in flight all await the same shared future, so only one schema
//! setup ever runs. A handle that fails its health probe is discarded and
//! the next caller transparently triggers a fresh open.

use futures::future::{BoxFuture, FutureExt, Shared};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

use super::error::StorageError;

type OpenFuture = Shared<BoxFuture<'static, Result<SqlitePool, StorageError>>>;

enum HandleState {
    Closed,
    Opening(OpenFuture),
    Ready { pool: SqlitePool, generation: u64 },
}

enum Step {
    Probe(SqlitePool, u64),
    Await(OpenFuture),
}

/// Owner of the lazily created SQLite pool.
pub struct Connection {
    path: PathBuf,
    state: Mutex<HandleState>,
    next_generation: AtomicU64,
}

impl Connection {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: Mutex::new(HandleState::Closed),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Returns a healthy pool, opening or reopening the database as needed.
    ///
    /// Every repository operation passes through here; no query is ever
    /// issued against a handle known to be stale.
    pub async fn acquire(&self) -> Result<SqlitePool, StorageError> {
        loop {
            let step = {
                let mut state = self.state.lock().expect("connection state lock poisoned");
                match &*state {
                    HandleState::Ready { pool, generation } => {
                        Step::Probe(pool.clone(), *generation)
                    }
                    HandleState::Opening(fut) => Step::Await(fut.clone()),
                    HandleState::Closed => {
                        let fut = open_pool(self.path.clone()).boxed().shared();
                        *state = HandleState::Opening(fut.clone());
                        Step::Await(fut)
                    }
                }
            };

            match step {
                Step::Probe(pool, generation) => {
                    if sqlx::query("SELECT 1").execute(&pool).await.is_ok() {
                        return Ok(pool);
                    }
                    debug!(path = %self.path.display(), "stale sqlite handle, reopening");
                    let mut state = self.state.lock().expect("connection state lock poisoned");
                    // Only discard if nobody reopened behind our back.
                    if matches!(&*state, HandleState::Ready { generation: g, .. } if *g == generation)
                    {
                        *state = HandleState::Closed;
                    }
                }
                Step::Await(fut) => {
                    let result = fut.clone().await;
                    let mut state = self.state.lock().expect("connection state lock poisoned");
                    if matches!(&*state, HandleState::Opening(current) if current.ptr_eq(&fut)) {
                        *state = match &result {
                            Ok(pool) => HandleState::Ready {
                                pool: pool.clone(),
                                generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
                            },
                            Err(_) => HandleState::Closed,
                        };
                    }
                    return result;
                }
            }
        }
    }
}

async fn open_pool(path: PathBuf) -> Result<SqlitePool, StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| StorageError::Unavailable(format!("{}: {}", parent.display(), e)))?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());
    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    debug!(path = %path.display(), "sqlite database opened");
    Ok(pool)
}

/// Idempotent schema setup; repeated opens across restarts never fail or
/// duplicate tables.
async fn create_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS meals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            meal_type TEXT NOT NULL,
            data TEXT NOT NULL,
            image_base64 TEXT,
            timestamp INTEGER NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS water_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            amount INTEGER NOT NULL,
            timestamp INTEGER NOT NULL
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_meals_date ON meals(date)",
        "CREATE INDEX IF NOT EXISTS idx_water_logs_date ON water_logs(date)",
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
