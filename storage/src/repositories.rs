//! All repositories on one shared pool.

use std::time::Duration;

use crate::announcement_repo::AnnouncementRepository;
use crate::counter_repo::CounterRepository;
use crate::error::Result;
use crate::job_execution_repo::JobExecutionRepository;
use crate::message_repo::MessageRepository;
use crate::sqlite_pool::SqlitePoolManager;

/// The four durable tables behind the bot.
#[derive(Clone)]
pub struct Repositories {
    pub messages: MessageRepository,
    pub counters: CounterRepository,
    pub announcements: AnnouncementRepository,
    pub jobs: JobExecutionRepository,
}

impl Repositories {
    /// Connects (retrying `attempts` times, `delay` apart) and creates every table.
    pub async fn connect(database_url: &str, attempts: u32, delay: Duration) -> Result<Self> {
        let pool_manager =
            SqlitePoolManager::connect_with_retry(database_url, attempts, delay).await?;
        Self::with_pool(pool_manager).await
    }

    pub async fn with_pool(pool_manager: SqlitePoolManager) -> Result<Self> {
        Ok(Self {
            messages: MessageRepository::with_pool(pool_manager.clone()).await?,
            counters: CounterRepository::with_pool(pool_manager.clone()).await?,
            announcements: AnnouncementRepository::with_pool(pool_manager.clone()).await?,
            jobs: JobExecutionRepository::with_pool(pool_manager).await?,
        })
    }
}
