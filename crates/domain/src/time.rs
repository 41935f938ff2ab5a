//! Clock ranges used by the `time` and `date` condition atoms.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A daily window such as `22:00-02:00`, compared at minute resolution.
///
/// When `end <= start` the window wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeRange {
    start: u32,
    end: u32,
}

impl TimeRange {
    /// Build a range from `(hour, minute)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimeRange`] if an hour or minute is
    /// out of bounds.
    pub fn new(start: (u32, u32), end: (u32, u32)) -> Result<Self, ValidationError> {
        let minutes = |(h, m): (u32, u32)| (h < 24 && m < 60).then_some(h * 60 + m);
        match (minutes(start), minutes(end)) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(ValidationError::InvalidTimeRange(format!(
                "{:02}:{:02}-{:02}:{:02}",
                start.0, start.1, end.0, end.1
            ))),
        }
    }

    #[must_use]
    pub fn wraps_midnight(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `time` falls inside the window, bounds included.
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        let t = time.hour() * 60 + time.minute();
        if self.wraps_midnight() {
            t >= self.start || t <= self.end
        } else {
            self.start <= t && t <= self.end
        }
    }
}

impl FromStr for TimeRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTimeRange(s.to_string());
        let (start, end) = s.split_once('-').ok_or_else(invalid)?;
        let parse = |part: &str| {
            NaiveTime::parse_from_str(part.trim(), "%H:%M")
                .map(|t| (t.hour(), t.minute()))
                .map_err(|_| invalid())
        };
        Self::new(parse(start)?, parse(end)?)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start / 60,
            self.start % 60,
            self.end / 60,
            self.end % 60
        )
    }
}

impl TryFrom<String> for TimeRange {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeRange> for String {
    fn from(range: TimeRange) -> Self {
        range.to_string()
    }
}

/// A yearly window such as `25/12-05/01`, compared on month and day only.
///
/// When `end <= start` the window wraps past the new year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateRange {
    start: (u32, u32),
    end: (u32, u32),
}

impl DateRange {
    /// Build a range from `(day, month)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDateRange`] if a day does not exist
    /// in its month (29 February is accepted).
    pub fn new(start: (u32, u32), end: (u32, u32)) -> Result<Self, ValidationError> {
        // Leap year so that 29/02 is representable.
        let month_day = |(d, m): (u32, u32)| NaiveDate::from_ymd_opt(2024, m, d).map(|_| (m, d));
        match (month_day(start), month_day(end)) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(ValidationError::InvalidDateRange(format!(
                "{:02}/{:02}-{:02}/{:02}",
                start.0, start.1, end.0, end.1
            ))),
        }
    }

    #[must_use]
    pub fn wraps_year(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `date` falls inside the window, bounds included. The year
    /// of `date` is ignored.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        let md = (date.month(), date.day());
        if self.wraps_year() {
            md >= self.start || md <= self.end
        } else {
            self.start <= md && md <= self.end
        }
    }
}

impl FromStr for DateRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidDateRange(s.to_string());
        let (start, end) = s.split_once('-').ok_or_else(invalid)?;
        let parse = |part: &str| -> Result<(u32, u32), ValidationError> {
            let normalized = part.trim().replace(':', "/");
            let (day, month) = normalized.split_once('/').ok_or_else(invalid)?;
            let day = day.parse().map_err(|_| invalid())?;
            let month = month.parse().map_err(|_| invalid())?;
            Ok((day, month))
        };
        Self::new(parse(start)?, parse(end)?).map_err(|_| invalid())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02}-{:02}/{:02}",
            self.start.1, self.start.0, self.end.1, self.end.0
        )
    }
}

impl TryFrom<String> for DateRange {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateRange> for String {
    fn from(range: DateRange) -> Self {
        range.to_string()
    }
}
