//! Month keys used to bucket messages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlackLogError};

/// A calendar month, ordered by year then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Create a key, validating that `month` lies in `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(SlackLogError::InvalidMonthKey {
                value: format!("{year}-{month}"),
            });
        }
        Ok(Self { year, month })
    }

    /// Parse a key from decimal year and month strings (e.g. `"2024"`, `"01"`).
    pub fn parse(year: &str, month: &str) -> Result<Self> {
        let invalid = || SlackLogError::InvalidMonthKey {
            value: format!("{year}-{month}"),
        };
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }

    /// Year component.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month component (1-12).
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// The following month.
    #[must_use]
    pub const fn next(&self) -> Self {
        if self.month >= 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding month.
    #[must_use]
    pub const fn prev(&self) -> Self {
        if self.month <= 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Year formatted with four digits.
    #[must_use]
    pub fn year_str(&self) -> String {
        format!("{:04}", self.year)
    }

    /// Month formatted with two digits.
    #[must_use]
    pub fn month_str(&self) -> String {
        format!("{:02}", self.month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
