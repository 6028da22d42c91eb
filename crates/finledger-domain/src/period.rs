//! Accounting periods (calendar months) and the inclusive date windows they span.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar;

const MONTH_NAMES_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTH_NAMES_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// One calendar month identified by `(month, year)`.
///
/// Field order matters: the derived ordering compares `year` first, then `month`.
/// Values can only be built through [`Period::new`] or from a calendar date, so the
/// month is always in `1..=12` and every day of the period is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawPeriod {
    month: u32,
    year: i32,
}

impl TryFrom<RawPeriod> for Period {
    type Error = PeriodError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        Period::new(raw.month, raw.year)
    }
}

impl Period {
    /// Validates `month` and `year` and returns the period.
    pub fn new(month: u32, year: i32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        if !(NaiveDate::MIN.year()..=NaiveDate::MAX.year()).contains(&year) {
            return Err(PeriodError::YearOutOfRange(year));
        }
        Ok(Self { year, month })
    }

    /// Returns the period that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The following month, rolling December over into January of the next year.
    pub fn next(&self) -> Result<Self, PeriodError> {
        self.offset(1)
    }

    /// The preceding month, rolling January back into December of the prior year.
    pub fn previous(&self) -> Result<Self, PeriodError> {
        self.offset(-1)
    }

    /// Shifts the period by a signed number of months.
    ///
    /// Fails with [`PeriodError::YearOutOfRange`] when the result leaves the calendar range.
    pub fn offset(&self, months: i32) -> Result<Self, PeriodError> {
        let index = i64::from(self.year) * 12 + i64::from(self.month) - 1 + i64::from(months);
        let year = index.div_euclid(12);
        let year = i32::try_from(year)
            .map_err(|_| PeriodError::YearOutOfRange(if year < 0 { i32::MIN } else { i32::MAX }))?;
        Self::new(index.rem_euclid(12) as u32 + 1, year)
    }

    /// Number of calendar days in the period.
    pub fn days(&self) -> u32 {
        calendar::month_length(self.year, self.month)
    }

    pub fn first_day(&self) -> NaiveDate {
        ymd(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> NaiveDate {
        ymd(self.year, self.month, self.days())
    }

    /// Inclusive window from the first to the last day of the period.
    pub fn bounds(&self) -> DateWindow {
        DateWindow {
            start: self.first_day(),
            end: self.last_day(),
        }
    }

    /// Returns the date for `day` in this period, clamped into the month.
    pub fn date_on(&self, day: u32) -> NaiveDate {
        ymd(self.year, self.month, calendar::clamp_day_of_month(day, *self))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Long month name followed by the year, localized for English or Spanish.
    pub fn display_name(&self, locale: &str) -> String {
        let index = (self.month - 1) as usize;
        let name = if locale.trim().to_ascii_lowercase().starts_with("es") {
            MONTH_NAMES_ES[index]
        } else {
            MONTH_NAMES_EN[index]
        };
        format!("{} {}", name, self.year)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PeriodError> {
        if end < start {
            return Err(PeriodError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Both ends are inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Returns the window cut off at `date` (inclusive), never extending it.
    pub fn through(&self, date: NaiveDate) -> Self {
        Self {
            start: self.start,
            end: self.end.min(date).max(self.start),
        }
    }
}

/// Errors raised when period or window input is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodError {
    InvalidMonth(u32),
    YearOutOfRange(i32),
    InvalidWindow { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for PeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodError::InvalidMonth(month) => {
                write!(f, "month must be between 1 and 12, got {month}")
            }
            PeriodError::YearOutOfRange(year) => write!(f, "year {year} is out of range"),
            PeriodError::InvalidWindow { start, end } => {
                write!(f, "date window end {end} is before start {start}")
            }
        }
    }
}

impl std::error::Error for PeriodError {}

// `Period::new` only admits years chrono can represent in full and callers clamp the day.
fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("period dates are always representable")
}
