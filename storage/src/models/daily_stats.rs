//! Aggregate statistics for one chat and one UTC day.
//!
//! Returned by MessageRepository::get_daily_stats.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserActivity {
    pub username: Option<String>,
    pub message_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    /// Human and bot messages together.
    pub total_messages: i64,
    /// Most active human senders, busiest first.
    pub top_users: Vec<UserActivity>,
    pub bot_messages: i64,
}
