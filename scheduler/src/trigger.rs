//! When a job fires.

use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Once a day at a fixed UTC time.
    DailyAt(NaiveTime),
    /// Repeatedly, `Duration` apart.
    Every(Duration),
}

impl Trigger {
    /// Daily at `hour:minute` UTC; `None` for an invalid time.
    pub fn daily(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self::DailyAt)
    }

    /// The first fire time strictly after `after`.
    pub fn next_fire(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::DailyAt(time) => next_occurrence(after, *time),
            Self::Every(period) => {
                let step = chrono::Duration::from_std(*period)
                    .unwrap_or_else(|_| chrono::Duration::seconds(1))
                    .max(chrono::Duration::seconds(1));
                after + step
            }
        }
    }
}

/// Today at `time` if that is still ahead of `now`, otherwise tomorrow at `time`.
pub fn next_occurrence(now: DateTime<Utc>, time: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(time).and_utc();
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}
