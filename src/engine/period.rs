use std::str::FromStr;

use chrono::NaiveDate;
use derive_more::Display;

use crate::error::PayrollError;

/// Day of month on which each pay window opens and closes.
pub const CUTOFF_DAY: u32 = 26;

/// A calendar month selected for payroll, together with its pay window:
/// the 26th of the prior month (inclusive) to the 26th of this month
/// (exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(fmt = "{:04}-{:02}", year, month)]
pub struct PayMonth {
    year: i32,
    month: u32,
    start: NaiveDate,
    end: NaiveDate,
}

impl PayMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, PayrollError> {
        if !(1..=9999).contains(&year) {
            return Err(PayrollError::validation(format!(
                "year {year} is out of range"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(PayrollError::validation(format!(
                "month {month} is out of range (1-12)"
            )));
        }

        let (prev_year, prev_month) = if month == 1 {
            (year - 1, 12)
        } else {
            (year, month - 1)
        };

        let start = NaiveDate::from_ymd_opt(prev_year, prev_month, CUTOFF_DAY);
        let end = NaiveDate::from_ymd_opt(year, month, CUTOFF_DAY);
        match (start, end) {
            (Some(start), Some(end)) => Ok(Self {
                year,
                month,
                start,
                end,
            }),
            _ => Err(PayrollError::validation(format!(
                "cannot build a pay window for {year}-{month:02}"
            ))),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the window.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// First day after the window.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

impl FromStr for PayMonth {
    type Err = PayrollError;

    /// Parses a `YYYY-MM` identifier.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            PayrollError::validation(format!(
                "invalid month '{value}', expected format YYYY-MM"
            ))
        };

        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;

        Self::new(year, month)
    }
}
