//! Month-boundary preconditions for daily-polled jobs.

use chrono::{Datelike, Days, NaiveDate};

/// Decides whether a fired job should run on the given UTC date.
pub type Precondition = fn(NaiveDate) -> bool;

pub fn is_first_day_of_month(date: NaiveDate) -> bool {
    date.day() == 1
}

pub fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.checked_add_days(Days::new(1))
        .map_or(true, |next| next.month() != date.month())
}
