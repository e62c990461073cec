//! Month-granularity reporting periods.
//!
//! The police API publishes data one calendar month at a time and accepts
//! the month as a `YYYY-MM` string. [`Period`] is the validated form of that
//! string and is used both as a query parameter and as part of every cache
//! key.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};

/// Error returned when a string is not a valid `YYYY-MM` month.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid period {value:?}: expected a YYYY-MM month")]
pub struct InvalidPeriodError {
    /// The rejected input.
    pub value: String,
}

/// A single calendar month, e.g. `2025-04`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a period from a year and a 1-based month.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPeriodError`] if the month is outside `1..=12` or the
    /// year is not representable as a calendar date.
    pub fn new(year: i32, month: u32) -> Result<Self, InvalidPeriodError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self::from_date)
            .ok_or_else(|| InvalidPeriodError {
                value: format!("{year}-{month}"),
            })
    }

    fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// The 1-based calendar month.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Returns the following month, or `None` past the end of the calendar.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        let (year, month) = if self.month == 12 {
            (self.year.checked_add(1)?, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).map(Self::from_date)
    }

    /// Expands an inclusive month range into every month it covers.
    ///
    /// Returns an empty list when `end` precedes `start`.
    ///
    /// # Example
    ///
    /// ```
    /// use police_map_records_models::Period;
    ///
    /// let start: Period = "2024-11".parse().unwrap();
    /// let end: Period = "2025-02".parse().unwrap();
    ///
    /// let months: Vec<String> = Period::range(start, end)
    ///     .iter()
    ///     .map(ToString::to_string)
    ///     .collect();
    ///
    /// assert_eq!(months, vec!["2024-11", "2024-12", "2025-01", "2025-02"]);
    /// ```
    #[must_use]
    pub fn range(start: Self, end: Self) -> Vec<Self> {
        let mut periods = Vec::new();
        let mut current = Some(start);

        while let Some(period) = current {
            if period > end {
                break;
            }
            periods.push(period);
            current = period.next();
        }

        periods
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = InvalidPeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || InvalidPeriodError {
            value: s.to_string(),
        };

        let (year, month) = trimmed.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || !(1..=2).contains(&month.len()) {
            return Err(invalid());
        }

        let date = NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
            .map_err(|_| invalid())?;

        Ok(Self::from_date(date))
    }
}

impl TryFrom<String> for Period {
    type Error = InvalidPeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}
