//! Calendar-quarter tokens (`YYYY-Qn`) used as the persistence partition key.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{ResearchQueueError, Result};

const SEPARATOR: &str = "-Q";
/// Four-digit years.
const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// One calendar quarter, e.g. `2024-Q3`.
///
/// Ordering is chronological. The serialized form is always the string token,
/// so a `Quarter` can sit directly in snapshot documents and the index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quarter {
    year: i32,
    quarter: u8,
}

impl Quarter {
    /// Builds a quarter from its parts, rejecting quarter numbers outside `1..=4`
    /// and years outside `1..=9999`.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchQueueError::InvalidQuarter`] for an out-of-range part.
    pub fn new(year: i32, quarter: u8) -> Result<Self> {
        if !(1..=4).contains(&quarter) || !YEARS.contains(&year) {
            return Err(ResearchQueueError::InvalidQuarter(format!(
                "{year}{SEPARATOR}{quarter}"
            )));
        }
        Ok(Self { year, quarter })
    }

    /// The quarter containing today's local date.
    #[must_use]
    pub fn current() -> Self {
        Self::containing(chrono::Local::now().date_naive())
    }

    /// The quarter containing `date`: `ceil(month / 3)`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: ((date.month() + 2) / 3) as u8,
        }
    }

    /// Parses a `YYYY-Qn` token.
    ///
    /// Only the two integer halves are checked, plus the ranges accepted by
    /// [`Quarter::new`]; anything else is reported as invalid rather than panicking.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchQueueError::InvalidQuarter`] for malformed tokens.
    pub fn parse(token: &str) -> Result<Self> {
        let invalid = || ResearchQueueError::InvalidQuarter(token.to_string());
        let (year, quarter) = token.split_once(SEPARATOR).ok_or_else(invalid)?;
        let year = year.trim().parse::<i32>().map_err(|_| invalid())?;
        let quarter = quarter.trim().parse::<u8>().map_err(|_| invalid())?;
        Self::new(year, quarter).map_err(|_| invalid())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// The quarter before this one; `Q1` rolls back to `Q4` of the previous year.
    #[must_use]
    pub fn previous(&self) -> Self {
        if self.quarter == 1 {
            Self { year: self.year - 1, quarter: 4 }
        } else {
            Self { year: self.year, quarter: self.quarter - 1 }
        }
    }

    /// The quarter after this one; `Q4` rolls over to `Q1` of the next year.
    #[must_use]
    pub fn next(&self) -> Self {
        if self.quarter == 4 {
            Self { year: self.year + 1, quarter: 1 }
        } else {
            Self { year: self.year, quarter: self.quarter + 1 }
        }
    }

    /// Whether forward navigation is offered from this quarter.
    ///
    /// Stepping forward is disabled only while sitting on the current quarter.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        *self != Self::current()
    }

    /// Local cache key holding this quarter's forest.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("research-queue-{self}")
    }

    /// Conventional remote path of this quarter's snapshot document.
    #[must_use]
    pub fn snapshot_path(&self) -> String {
        format!("data/{self}/queue.json")
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.year, self.quarter)
    }
}

impl FromStr for Quarter {
    type Err = ResearchQueueError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Quarter {
    type Error = ResearchQueueError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Quarter> for String {
    fn from(q: Quarter) -> Self {
        q.to_string()
    }
}
