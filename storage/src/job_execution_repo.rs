//! SQLite-backed [`ExecutionLedger`].

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::error::Result;
use crate::ledger::ExecutionLedger;
use crate::models::JobKey;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct JobExecutionRepository {
    pool_manager: SqlitePoolManager,
}

impl JobExecutionRepository {
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
            CREATE TABLE IF NOT EXISTS scheduled_job_executions (
                job_name TEXT NOT NULL,
                slot TEXT NOT NULL DEFAULT '',
                execution_date TEXT NOT NULL,
                executed_at TEXT NOT NULL,
                PRIMARY KEY (job_name, slot, execution_date)
            )
            "#,
        )
        .execute(self.pool_manager.pool())
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ExecutionLedger for JobExecutionRepository {
    async fn record(&self, key: &JobKey, date: NaiveDate) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO scheduled_job_executions (job_name, slot, execution_date, executed_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (job_name, slot, execution_date) DO NOTHING
            "#,
        )
        .bind(&key.base)
        .bind(key.slot_column())
        .bind(date)
        .bind(Utc::now())
        .execute(self.pool_manager.pool())
        .await?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            info!(job = %key, %date, "Job execution recorded");
        } else {
            debug!(job = %key, %date, "Job execution already recorded");
        }
        Ok(inserted)
    }

    async fn is_recorded(&self, key: &JobKey, date: NaiveDate) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT 1 FROM scheduled_job_executions
            WHERE job_name = ? AND slot = ? AND execution_date = ?
            "#,
        )
        .bind(&key.base)
        .bind(key.slot_column())
        .bind(date)
        .fetch_optional(self.pool_manager.pool())
        .await?;
        Ok(row.is_some())
    }
}
