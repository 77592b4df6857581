//! Calendar month periods used to filter and export transactions.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::{Date, Month, PrimitiveDateTime, Time};

use crate::Error;

/// A calendar month, e.g. March 2025.
///
/// The period covers every instant from midnight on the first day of the
/// month up to, but not including, midnight on the first day of the next
/// month. December rolls over into January of the next year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthPeriod {
    start: Date,
    end: Date,
}

impl MonthPeriod {
    /// Create the period for `month` (1 to 12) of `year`.
    ///
    /// # Errors
    /// Returns an [Error::InvalidPeriod] if the month is not between 1 and 12
    /// or if the year is outside the supported calendar range.
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        let invalid = || Error::InvalidPeriod { year, month };

        let month_of_year = Month::try_from(month).map_err(|_| invalid())?;
        let start = Date::from_calendar_date(year, month_of_year, 1).map_err(|_| invalid())?;

        let end = match month_of_year {
            Month::December => Date::from_calendar_date(year + 1, Month::January, 1),
            other => Date::from_calendar_date(year, other.next(), 1),
        }
        .map_err(|_| invalid())?;

        Ok(Self { start, end })
    }

    /// Build an optional period from a year and month given separately, e.g.
    /// from a query string.
    ///
    /// Returns `None` if neither is given.
    ///
    /// # Errors
    /// Returns an [Error::IncompletePeriod] if only one of them is given, or
    /// an [Error::InvalidPeriod] if they do not form a valid month.
    pub fn from_parts(year: Option<i32>, month: Option<u8>) -> Result<Option<Self>, Error> {
        match (year, month) {
            (Some(year), Some(month)) => Self::new(year, month).map(Some),
            (None, None) => Ok(None),
            _ => Err(Error::IncompletePeriod),
        }
    }

    /// The month that contains `date`.
    pub fn containing(date: Date) -> Result<Self, Error> {
        Self::new(date.year(), date.month() as u8)
    }

    /// The calendar year of the period.
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// The month of the period, 1-indexed.
    pub fn month(&self) -> u8 {
        self.start.month() as u8
    }

    /// Midnight on the first day of the month (inclusive).
    pub fn start(&self) -> PrimitiveDateTime {
        PrimitiveDateTime::new(self.start, Time::MIDNIGHT)
    }

    /// Midnight on the first day of the next month (exclusive).
    pub fn end(&self) -> PrimitiveDateTime {
        PrimitiveDateTime::new(self.end, Time::MIDNIGHT)
    }

    /// Whether `timestamp` falls inside the period.
    pub fn contains(&self, timestamp: PrimitiveDateTime) -> bool {
        timestamp >= self.start() && timestamp < self.end()
    }

    /// The label used in export file names, e.g. "03.2025".
    pub fn file_label(&self) -> String {
        format!("{:02}.{}", self.month(), self.year())
    }
}

impl Display for MonthPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.start.month(), self.year())
    }
}
