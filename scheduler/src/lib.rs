//! # scheduler
//!
//! Recurring jobs that run at most once per UTC day (per slot), even across restarts and
//! overlapping ticks. Each fire goes through: precondition → ledger record → job body. Only the
//! caller that newly records `(job, slot, date)` in the [`storage::ExecutionLedger`] executes.
//!
//! [`AnnouncementSweep`] is the interval job that delivers due scheduled announcements.

mod announcements;
mod calendar;
mod clock;
mod engine;
mod job;
mod trigger;

pub use announcements::{
    parse_time_of_day, schedule_announcement, AnnouncementSweep, SweepReport,
};
pub use calendar::{is_first_day_of_month, is_last_day_of_month, Precondition};
pub use clock::{Clock, SystemClock};
pub use engine::JobScheduler;
pub use job::{execute, job_fn, JobOutcome, JobSpec, ScheduledJob};
pub use trigger::{next_occurrence, Trigger};
