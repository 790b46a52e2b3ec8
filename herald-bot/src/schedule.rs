//! The bot's daily schedule (UTC) and its registration with the [`JobScheduler`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use scheduler::{
    is_first_day_of_month, is_last_day_of_month, job_fn, AnnouncementSweep, JobScheduler,
    JobSpec, Precondition, Trigger,
};
use storage::JobKey;

use crate::content::{ContentJob, ContentService};

/// One daily entry of the schedule.
#[derive(Debug, Clone, Copy)]
pub struct DailyEntry {
    pub job: ContentJob,
    pub slot: Option<&'static str>,
    pub hour: u32,
    pub minute: u32,
    pub precondition: Option<Precondition>,
}

const fn entry(job: ContentJob, slot: Option<&'static str>, hour: u32, minute: u32) -> DailyEntry {
    DailyEntry {
        job,
        slot,
        hour,
        minute,
        precondition: None,
    }
}

pub const DAILY_SCHEDULE: [DailyEntry; 9] = [
    entry(ContentJob::MorningReport, None, 5, 45),
    entry(ContentJob::Summary, None, 20, 0),
    entry(ContentJob::DailyReport, None, 20, 20),
    entry(ContentJob::RandomFact, Some("morning"), 7, 30),
    entry(ContentJob::RandomFact, Some("evening"), 17, 0),
    entry(ContentJob::HistoryFact, Some("morning"), 10, 0),
    entry(ContentJob::HistoryFact, Some("afternoon"), 18, 30),
    DailyEntry {
        precondition: Some(is_first_day_of_month),
        ..entry(ContentJob::CashbackReminder, None, 5, 0)
    },
    DailyEntry {
        precondition: Some(is_last_day_of_month),
        ..entry(ContentJob::PaymentsReminder, Some("last_day_of_month"), 18, 0)
    },
];

pub const ANNOUNCEMENT_SWEEP_JOB: &str = "announcement_sweep";

impl DailyEntry {
    pub fn key(&self) -> JobKey {
        match self.slot {
            Some(slot) => JobKey::with_slot(self.job.name(), slot),
            None => JobKey::new(self.job.name()),
        }
    }
}

/// Job specs for the daily schedule against `report_chat_id`, plus the ungated announcement sweep.
pub fn build_jobs(
    content: Arc<ContentService>,
    report_chat_id: i64,
    sweep: AnnouncementSweep,
    sweep_period: Duration,
) -> Result<Vec<JobSpec>> {
    let mut jobs = Vec::with_capacity(DAILY_SCHEDULE.len() + 1);
    for entry in DAILY_SCHEDULE {
        let trigger = Trigger::daily(entry.hour, entry.minute)
            .with_context(|| format!("invalid time for {}", entry.key()))?;
        let content = content.clone();
        let job = entry.job;
        let body = job_fn(move || {
            let content = content.clone();
            async move { content.run(job, report_chat_id).await }
        });
        let mut spec = JobSpec::daily(entry.key(), trigger, body);
        if let Some(precondition) = entry.precondition {
            spec = spec.with_precondition(precondition);
        }
        jobs.push(spec);
    }
    jobs.push(JobSpec::every(
        JobKey::new(ANNOUNCEMENT_SWEEP_JOB),
        sweep_period,
        Arc::new(sweep),
    ));
    Ok(jobs)
}

/// Registers every job with `scheduler`.
pub fn register_jobs(scheduler: &mut JobScheduler, jobs: Vec<JobSpec>) {
    for spec in jobs {
        scheduler.add(spec);
    }
}
