//! Durable queue of scheduled announcements.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::Result;
use crate::models::ScheduledAnnouncement;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct AnnouncementRepository {
    pool_manager: SqlitePoolManager,
}

impl AnnouncementRepository {
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
        let pool = self.pool_manager.pool();
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scheduled_announcements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id INTEGER NOT NULL,
                message_text TEXT NOT NULL,
                schedule_at TEXT NOT NULL,
                sent BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_announcements_due ON scheduled_announcements(sent, schedule_at)",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Queues `message_text` (already escaped) for `chat_id` and returns the new id.
    pub async fn add(
        &self,
        chat_id: i64,
        message_text: &str,
        schedule_at: DateTime<Utc>,
    ) -> Result<i64> {
        let id: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO scheduled_announcements (chat_id, message_text, schedule_at, sent, created_at)
            VALUES (?, ?, ?, FALSE, ?)
            RETURNING id
            "#,
        )
        .bind(chat_id)
        .bind(message_text)
        .bind(schedule_at)
        .bind(Utc::now())
        .fetch_one(self.pool_manager.pool())
        .await?;

        info!(id = id.0, chat_id, %schedule_at, "Announcement scheduled");
        Ok(id.0)
    }

    /// Unsent announcements whose time has come, oldest first.
    pub async fn due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledAnnouncement>> {
        let rows = sqlx::query_as::<_, ScheduledAnnouncement>(
            r#"
            SELECT id, chat_id, message_text, schedule_at, sent, created_at
            FROM scheduled_announcements
            WHERE sent = FALSE AND schedule_at <= ?
            ORDER BY schedule_at ASC, id ASC
            "#,
        )
        .bind(now)
        .fetch_all(self.pool_manager.pool())
        .await?;
        Ok(rows)
    }

    /// Flips the sent flag; returns false when the row was already sent or does not exist.
    pub async fn mark_sent(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE scheduled_announcements SET sent = TRUE WHERE id = ? AND sent = FALSE",
        )
        .bind(id)
        .execute(self.pool_manager.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, id: i64) -> Result<Option<ScheduledAnnouncement>> {
        let row = sqlx::query_as::<_, ScheduledAnnouncement>(
            r#"
            SELECT id, chat_id, message_text, schedule_at, sent, created_at
            FROM scheduled_announcements WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool_manager.pool())
        .await?;
        Ok(row)
    }
}
