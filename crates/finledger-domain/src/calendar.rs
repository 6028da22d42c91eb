//! Calendar arithmetic for accounting periods. Pure functions, no side effects.

use chrono::NaiveDate;

use crate::period::{DateWindow, Period, PeriodError};

/// Returns the period immediately before the one containing `today`.
pub fn previous_period(today: NaiveDate) -> Result<Period, PeriodError> {
    Period::containing(today).previous()
}

/// Returns the period after `period`, rolling December into January of the next year.
pub fn next_period(period: Period) -> Result<Period, PeriodError> {
    period.next()
}

/// First and last calendar day of `period`, both inclusive.
pub fn period_bounds(period: Period) -> DateWindow {
    period.bounds()
}

pub fn days_in_month(period: Period) -> u32 {
    period.days()
}

/// Clamps a day-of-month into `period`: `min(day, days_in_month)`, with day 0 lifted to 1.
pub fn clamp_day_of_month(day: u32, period: Period) -> u32 {
    day.clamp(1, period.days())
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub(crate) fn month_length(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}
