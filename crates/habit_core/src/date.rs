//! Calendar dates in their canonical `YYYY-MM-DD` form.
//!
//! A [`CalendarDate`] is a local calendar day, never an instant: nothing in
//! this module consults a timezone. Ordering is chronological, which is the
//! same as the lexicographic order of the canonical text because the format
//! is fixed-width and zero-padded.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{HabitError, HabitResult};

const CANONICAL_FORMAT: &str = "%Y-%m-%d";
const CANONICAL_LEN: usize = 10;

/// Weekday abbreviations in Monday-first order, as stored in `Habit::days`.
pub const WEEKDAY_ABBREVIATIONS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Parse the canonical form. Unpadded fields, time suffixes and
    /// impossible days are all rejected.
    pub fn parse(input: &str) -> HabitResult<Self> {
        let bytes = input.as_bytes();
        let well_formed = bytes.len() == CANONICAL_LEN
            && bytes.iter().enumerate().all(|(idx, byte)| match idx {
                4 | 7 => *byte == b'-',
                _ => byte.is_ascii_digit(),
            });
        if !well_formed {
            return Err(HabitError::MalformedDate(input.to_string()));
        }
        NaiveDate::parse_from_str(input, CANONICAL_FORMAT)
            .map(Self)
            .map_err(|_| HabitError::MalformedDate(input.to_string()))
    }

    /// Build a date from a local `(year, month, day)` triple.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> HabitResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| HabitError::MalformedDate(format!("{year:04}-{month:02}-{day:02}")))
            .and_then(Self::from_naive)
    }

    /// Wrap a chrono date. Years outside `0..=9999` have no four-digit
    /// canonical form and are rejected.
    pub fn from_naive(date: NaiveDate) -> HabitResult<Self> {
        if (0..=9999).contains(&date.year()) {
            Ok(Self(date))
        } else {
            Err(HabitError::MalformedDate(date.to_string()))
        }
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Full English weekday name, e.g. "Saturday".
    pub fn weekday_name(&self) -> &'static str {
        match self.0.weekday() {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }

    /// First three characters of [`Self::weekday_name`], e.g. "Sat".
    pub fn weekday_abbrev(&self) -> &'static str {
        &self.weekday_name()[..3]
    }

    /// Long form used for headings, e.g. "July 26, 2025".
    pub fn human_readable(&self) -> String {
        self.0.format("%B %-d, %Y").to_string()
    }

    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().and_then(|date| Self::from_naive(date).ok())
    }

    pub fn pred(&self) -> Option<Self> {
        self.0.pred_opt().and_then(|date| Self::from_naive(date).ok())
    }

    /// Every date of the month this date falls in, in order.
    pub fn month_days(&self) -> Vec<Self> {
        let mut days = Vec::with_capacity(31);
        let mut cursor = self.0.with_day(1);
        while let Some(date) = cursor {
            if date.month() != self.0.month() {
                break;
            }
            days.push(Self(date));
            cursor = date.succ_opt();
        }
        days
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for CalendarDate {
    type Err = HabitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CalendarDate {
    type Error = HabitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CalendarDate> for String {
    fn from(date: CalendarDate) -> Self {
        date.to_string()
    }
}

/// True when `abbrev` is one of [`WEEKDAY_ABBREVIATIONS`].
pub fn is_weekday_abbrev(abbrev: &str) -> bool {
    WEEKDAY_ABBREVIATIONS.contains(&abbrev)
}
