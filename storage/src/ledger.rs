//! Execution ledger abstraction used by the job scheduler.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::JobKey;

/// Durable "job ran on this date" facts.
#[async_trait]
pub trait ExecutionLedger: Send + Sync {
    /// Atomically records `(key, date)`. Returns `true` if this call created the record and
    /// `false` if it already existed. A duplicate is never an error.
    async fn record(&self, key: &JobKey, date: NaiveDate) -> Result<bool>;

    /// Whether `(key, date)` has been recorded.
    async fn is_recorded(&self, key: &JobKey, date: NaiveDate) -> Result<bool>;
}
