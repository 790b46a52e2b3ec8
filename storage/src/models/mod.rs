mod announcement;
mod daily_stats;
mod job_key;
mod message_record;

pub use announcement::ScheduledAnnouncement;
pub use daily_stats::{DailyStats, UserActivity};
pub use job_key::JobKey;
pub use message_record::MessageRecord;
