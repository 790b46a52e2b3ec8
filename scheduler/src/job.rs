//! Job definitions and the per-fire state machine.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use storage::{ExecutionLedger, JobKey};
use tracing::{error, info};

use crate::calendar::Precondition;
use crate::trigger::Trigger;

/// A job body. Errors are logged by the scheduler and never stop it.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    async fn run(&self) -> anyhow::Result<()>;
}

struct FnJob<F>(F);

#[async_trait]
impl<F, Fut> ScheduledJob for FnJob<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn run(&self) -> anyhow::Result<()> {
        (self.0)().await
    }
}

/// Wraps an async closure as a [`ScheduledJob`].
pub fn job_fn<F, Fut>(f: F) -> Arc<dyn ScheduledJob>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnJob(f))
}

/// A registered job: identity, trigger, optional precondition, body.
#[derive(Clone)]
pub struct JobSpec {
    pub key: JobKey,
    pub trigger: Trigger,
    pub precondition: Option<Precondition>,
    /// Whether fires are recorded in the ledger (daily jobs) or always run (interval sweeps).
    pub ledger_gated: bool,
    pub job: Arc<dyn ScheduledJob>,
}

impl JobSpec {
    /// A ledger-gated daily job.
    pub fn daily(key: JobKey, trigger: Trigger, job: Arc<dyn ScheduledJob>) -> Self {
        Self {
            key,
            trigger,
            precondition: None,
            ledger_gated: true,
            job,
        }
    }

    /// An ungated interval job.
    pub fn every(key: JobKey, period: std::time::Duration, job: Arc<dyn ScheduledJob>) -> Self {
        Self {
            key,
            trigger: Trigger::Every(period),
            precondition: None,
            ledger_gated: false,
            job,
        }
    }

    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.precondition = Some(precondition);
        self
    }
}

/// Result of one fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Executed,
    Failed(String),
    SkippedPrecondition,
    AlreadyRecorded,
    LedgerUnavailable(String),
}

/// One fire of `spec` for `date`: precondition, then ledger record, then the body.
///
/// A false precondition leaves no ledger row, so the job stays eligible on its next fire.
pub async fn execute(spec: &JobSpec, ledger: &dyn ExecutionLedger, date: NaiveDate) -> JobOutcome {
    let job = spec.key.to_string();

    if let Some(precondition) = spec.precondition {
        if !precondition(date) {
            info!(job = %job, %date, "step: precondition false, skipping");
            return JobOutcome::SkippedPrecondition;
        }
    }

    if spec.ledger_gated {
        match ledger.record(&spec.key, date).await {
            Ok(true) => info!(job = %job, %date, "step: execution recorded"),
            Ok(false) => {
                info!(job = %job, %date, "step: already executed today, skipping");
                return JobOutcome::AlreadyRecorded;
            }
            Err(e) => {
                error!(job = %job, %date, error = %e, "Execution ledger unavailable, skipping");
                return JobOutcome::LedgerUnavailable(e.to_string());
            }
        }
    }

    match spec.job.run().await {
        Ok(()) => {
            info!(job = %job, "step: job executed");
            JobOutcome::Executed
        }
        Err(e) => {
            error!(job = %job, error = %e, "Job failed");
            JobOutcome::Failed(e.to_string())
        }
    }
}
