//! The polling loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use storage::{ExecutionLedger, JobKey};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::job::{execute, JobOutcome, JobSpec};

struct Entry {
    spec: JobSpec,
    next_fire: DateTime<Utc>,
}

/// Wakes every `poll` and fires each job whose next fire time has passed. Fired jobs run on
/// their own tasks so a slow job never delays the others. Drift up to one poll period is
/// expected.
pub struct JobScheduler {
    entries: Vec<Entry>,
    ledger: Arc<dyn ExecutionLedger>,
    clock: Arc<dyn Clock>,
    poll: Duration,
    tracker: TaskTracker,
}

impl JobScheduler {
    pub fn new(ledger: Arc<dyn ExecutionLedger>, clock: Arc<dyn Clock>, poll: Duration) -> Self {
        Self {
            entries: Vec::new(),
            ledger,
            clock,
            poll,
            tracker: TaskTracker::new(),
        }
    }

    /// Registers a job. Its first fire is the next occurrence strictly after now; a time that
    /// already passed today is not replayed.
    pub fn add(&mut self, spec: JobSpec) {
        let next_fire = spec.trigger.next_fire(self.clock.now());
        info!(job = %spec.key, next_fire = %next_fire, "Job registered");
        self.entries.push(Entry { spec, next_fire });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Next fire time per job, in registration order.
    pub fn next_fires(&self) -> Vec<(JobKey, DateTime<Utc>)> {
        self.entries
            .iter()
            .map(|e| (e.spec.key.clone(), e.next_fire))
            .collect()
    }

    /// Ledger-gated jobs already recorded for today. A ledger error is logged and the job is
    /// left out.
    pub async fn ran_today(&self) -> Vec<JobKey> {
        let today = self.clock.now().date_naive();
        let mut done = Vec::new();
        for entry in self.entries.iter().filter(|e| e.spec.ledger_gated) {
            match self.ledger.is_recorded(&entry.spec.key, today).await {
                Ok(true) => done.push(entry.spec.key.clone()),
                Ok(false) => {}
                Err(e) => warn!(job = %entry.spec.key, error = %e, "Ledger lookup failed"),
            }
        }
        done
    }

    /// Fires every due job and advances its next fire time. Returns the spawned runs.
    pub fn tick(&mut self) -> Vec<(JobKey, JoinHandle<JobOutcome>)> {
        let now = self.clock.now();
        let mut fired = Vec::new();

        for entry in self.entries.iter_mut().filter(|e| e.next_fire <= now) {
            let date = entry.next_fire.date_naive();
            entry.next_fire = entry.spec.trigger.next_fire(now);

            let spec = entry.spec.clone();
            let ledger = self.ledger.clone();
            info!(job = %spec.key, %date, "step: job due");
            let handle = self
                .tracker
                .spawn(async move { execute(&spec, ledger.as_ref(), date).await });
            fired.push((entry.spec.key.clone(), handle));
        }
        fired
    }

    /// Runs until `cancel` fires, then waits for running jobs.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            jobs = self.entries.len(),
            poll_secs = self.poll.as_secs(),
            "Scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    for (key, handle) in self.tick() {
                        tokio::spawn(async move {
                            if let Err(e) = handle.await {
                                if e.is_panic() {
                                    warn!(job = %key, "Job panicked");
                                }
                            }
                        });
                    }
                }
            }
        }

        self.tracker.close();
        self.tracker.wait().await;
        info!("Scheduler stopped");
    }
}
