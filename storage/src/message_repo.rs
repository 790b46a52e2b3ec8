//! Message repository: persistence and queries for chat messages.
//!
//! Inserts are upserts keyed on `(chat_id, telegram_message_id)`, so webhook retries and
//! re-sent updates overwrite the earlier row instead of failing.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{DailyStats, MessageRecord, UserActivity};
use crate::sqlite_pool::SqlitePoolManager;

const TOP_USERS_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct MessageRepository {
    pool_manager: SqlitePoolManager,
}

/// `[start, end)` of a UTC calendar day.
pub(crate) fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

impl MessageRepository {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        Self::with_pool(pool_manager).await
    }

    /// Builds the repository on a shared pool and creates its table.
    pub async fn with_pool(pool_manager: SqlitePoolManager) -> Result<Self> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<()> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                telegram_message_id INTEGER NOT NULL,
                chat_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                username TEXT,
                message TEXT,
                timestamp TEXT NOT NULL,
                is_bot BOOLEAN NOT NULL DEFAULT FALSE,
                bot_message_type TEXT,
                UNIQUE (chat_id, telegram_message_id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_chat_timestamp ON messages(chat_id, timestamp)",
        )
        .execute(pool)
        .await?;

        debug!("messages table ready");
        Ok(())
    }

    /// Inserts the message, or overwrites the existing row for the same chat and message id.
    pub async fn upsert(&self, record: &MessageRecord) -> Result<()> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            INSERT INTO messages (telegram_message_id, chat_id, user_id, username, message, timestamp, is_bot, bot_message_type)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (chat_id, telegram_message_id) DO UPDATE SET
                user_id = excluded.user_id,
                username = excluded.username,
                message = excluded.message,
                timestamp = excluded.timestamp,
                is_bot = excluded.is_bot,
                bot_message_type = excluded.bot_message_type
            "#,
        )
        .bind(record.telegram_message_id)
        .bind(record.chat_id)
        .bind(record.user_id)
        .bind(&record.username)
        .bind(&record.message)
        .bind(record.timestamp)
        .bind(record.is_bot)
        .bind(&record.bot_message_type)
        .execute(pool)
        .await?;

        debug!(
            chat_id = record.chat_id,
            telegram_message_id = record.telegram_message_id,
            is_bot = record.is_bot,
            "Upserted message"
        );
        Ok(())
    }

    pub async fn get_message_by_id(
        &self,
        chat_id: i64,
        telegram_message_id: i64,
    ) -> Result<Option<MessageRecord>> {
        let pool = self.pool_manager.pool();

        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT telegram_message_id, chat_id, user_id, username, message, timestamp, is_bot, bot_message_type
            FROM messages WHERE chat_id = ? AND telegram_message_id = ?
            "#,
        )
        .bind(chat_id)
        .bind(telegram_message_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Last `limit` messages with content in the chat, oldest first.
    pub async fn get_recent_messages(&self, chat_id: i64, limit: i64) -> Result<Vec<MessageRecord>> {
        let pool = self.pool_manager.pool();

        let mut messages = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT telegram_message_id, chat_id, user_id, username, message, timestamp, is_bot, bot_message_type
            FROM messages
            WHERE chat_id = ? AND message IS NOT NULL
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(chat_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        messages.reverse();

        info!(
            chat_id,
            count = messages.len(),
            "Retrieved recent messages for context"
        );
        Ok(messages)
    }

    pub async fn get_daily_stats(&self, chat_id: i64, date: NaiveDate) -> Result<DailyStats> {
        let pool = self.pool_manager.pool();
        let (start, end) = day_bounds(date);

        let total: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE chat_id = ? AND timestamp >= ? AND timestamp < ?",
        )
        .bind(chat_id)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

        let top_users = sqlx::query_as::<_, UserActivity>(
            r#"
            SELECT username, COUNT(*) AS message_count FROM messages
            WHERE chat_id = ? AND timestamp >= ? AND timestamp < ? AND is_bot = FALSE
            GROUP BY username
            ORDER BY message_count DESC, username ASC
            LIMIT ?
            "#,
        )
        .bind(chat_id)
        .bind(start)
        .bind(end)
        .bind(TOP_USERS_LIMIT)
        .fetch_all(pool)
        .await?;

        let bot: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE chat_id = ? AND timestamp >= ? AND timestamp < ? AND is_bot = TRUE",
        )
        .bind(chat_id)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

        Ok(DailyStats {
            total_messages: total.0,
            top_users,
            bot_messages: bot.0,
        })
    }

    /// Human messages of the day as `(username, text)`, oldest first.
    pub async fn get_human_messages_for_day(
        &self,
        chat_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<(Option<String>, String)>> {
        let pool = self.pool_manager.pool();
        let (start, end) = day_bounds(date);

        let rows: Vec<(Option<String>, String)> = sqlx::query_as(
            r#"
            SELECT username, message FROM messages
            WHERE chat_id = ? AND timestamp >= ? AND timestamp < ?
              AND is_bot = FALSE AND message IS NOT NULL
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(chat_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
