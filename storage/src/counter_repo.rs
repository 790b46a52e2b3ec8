//! Per-chat, per-day profanity counters.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct CounterRepository {
    pool_manager: SqlitePoolManager,
}

impl CounterRepository {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        Self::with_pool(pool_manager).await
    }

    pub async fn with_pool(pool_manager: SqlitePoolManager) -> Result<Self> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS swear_counts (
                chat_id INTEGER NOT NULL,
                swear_date TEXT NOT NULL,
                count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (chat_id, swear_date)
            )
            "#,
        )
        .execute(self.pool_manager.pool())
        .await?;
        Ok(())
    }

    /// Adds `by` to the counter and returns the new total.
    ///
    /// One statement does insert-or-increment, so concurrent callers never lose an update.
    pub async fn increment(&self, chat_id: i64, date: NaiveDate, by: i64) -> Result<i64> {
        if by <= 0 {
            return Err(StorageError::InvalidInput(format!(
                "increment must be positive, got {}",
                by
            )));
        }

        let total: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO swear_counts (chat_id, swear_date, count) VALUES (?, ?, ?)
            ON CONFLICT (chat_id, swear_date) DO UPDATE SET count = count + excluded.count
            RETURNING count
            "#,
        )
        .bind(chat_id)
        .bind(date)
        .bind(by)
        .fetch_one(self.pool_manager.pool())
        .await?;

        debug!(chat_id, %date, by, total = total.0, "Incremented profanity counter");
        Ok(total.0)
    }

    /// Current total, zero when nothing was counted that day.
    pub async fn get(&self, chat_id: i64, date: NaiveDate) -> Result<i64> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT count FROM swear_counts WHERE chat_id = ? AND swear_date = ?")
                .bind(chat_id)
                .bind(date)
                .fetch_optional(self.pool_manager.pool())
                .await?;
        Ok(row.map(|r| r.0).unwrap_or(0))
    }
}
