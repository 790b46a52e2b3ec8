//! Storage crate: durable state for the bot.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – MessageRecord, DailyStats, ScheduledAnnouncement, JobKey
//! - [`message_repo`] – MessageRepository (upsert-keyed chat messages)
//! - [`counter_repo`] – CounterRepository (per-chat, per-day profanity counters)
//! - [`announcement_repo`] – AnnouncementRepository (scheduled announcements queue)
//! - [`ledger`] / [`job_execution_repo`] – ExecutionLedger and its SQLite implementation
//! - [`sqlite_pool`] – SqlitePoolManager

mod announcement_repo;
mod counter_repo;
mod error;
mod job_execution_repo;
mod ledger;
mod message_repo;
mod models;
mod repositories;
mod sqlite_pool;

pub use announcement_repo::AnnouncementRepository;
pub use counter_repo::CounterRepository;
pub use error::{Result, StorageError};
pub use job_execution_repo::JobExecutionRepository;
pub use ledger::ExecutionLedger;
pub use message_repo::MessageRepository;
pub use models::{DailyStats, JobKey, MessageRecord, ScheduledAnnouncement, UserActivity};
pub use repositories::Repositories;
pub use sqlite_pool::SqlitePoolManager;
