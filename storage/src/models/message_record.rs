//! Message record model for persistence.
//!
//! Maps to the `messages` table and is used by MessageRepository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chat message, human or bot. Unique per `(chat_id, telegram_message_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageRecord {
    pub telegram_message_id: i64,
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_bot: bool,
    /// Content tag for bot messages; `None` for human messages.
    pub bot_message_type: Option<String>,
}

impl MessageRecord {
    /// A human message stamped with the current time.
    pub fn new(
        telegram_message_id: i64,
        chat_id: i64,
        user_id: i64,
        username: Option<String>,
        message: Option<String>,
    ) -> Self {
        Self {
            telegram_message_id,
            chat_id,
            user_id,
            username,
            message,
            timestamp: Utc::now(),
            is_bot: false,
            bot_message_type: None,
        }
    }

    /// Marks the record as sent by the bot with the given content tag.
    pub fn from_bot(mut self, bot_message_type: Option<&str>) -> Self {
        self.is_bot = true;
        self.bot_message_type = bot_message_type.map(str::to_string);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
