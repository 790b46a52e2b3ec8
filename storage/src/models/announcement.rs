//! Scheduled announcement model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message queued for delivery at `schedule_at`. Rows are never deleted; `sent` flips once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduledAnnouncement {
    pub id: i64,
    pub chat_id: i64,
    /// Already escaped for MarkdownV2.
    pub message_text: String,
    pub schedule_at: DateTime<Utc>,
    pub sent: bool,
    pub created_at: DateTime<Utc>,
}
