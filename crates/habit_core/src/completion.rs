//! Per-habit completion history.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::date::CalendarDate;
use crate::habit::Habit;

/// Insertion-ordered set of completed dates.
///
/// Equality is set equality: two logs holding the same dates compare equal
/// whatever order the dates were recorded in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<CalendarDate>", into = "Vec<CalendarDate>")]
pub struct CompletionLog {
    entries: Vec<CalendarDate>,
    index: HashSet<CalendarDate>,
}

/// Outcome of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Completed,
    Cleared,
}

impl CompletionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.index.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dates in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &CalendarDate> {
        self.entries.iter()
    }

    /// Insert `date` if absent, remove it if present.
    pub fn toggle(&mut self, date: CalendarDate) -> Toggle {
        if self.index.remove(&date) {
            self.entries.retain(|entry| *entry != date);
            Toggle::Cleared
        } else {
            self.index.insert(date);
            self.entries.push(date);
            Toggle::Completed
        }
    }
}

impl PartialEq for CompletionLog {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for CompletionLog {}

impl TryFrom<Vec<CalendarDate>> for CompletionLog {
    type Error = String;

    fn try_from(entries: Vec<CalendarDate>) -> Result<Self, Self::Error> {
        let mut log = Self::new();
        for date in entries {
            if log.contains(date) {
                return Err(format!("completion log lists {date} more than once"));
            }
            log.toggle(date);
        }
        Ok(log)
    }
}

impl From<CompletionLog> for Vec<CalendarDate> {
    fn from(log: CompletionLog) -> Self {
        log.entries
    }
}

impl<'a> IntoIterator for &'a CompletionLog {
    type Item = &'a CalendarDate;
    type IntoIter = std::slice::Iter<'a, CalendarDate>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Return a copy of `habit` with `date` flipped in its completion log.
///
/// Only the in-memory value changes. Writing it back is up to the caller,
/// and nothing here makes that write atomic with the read that produced
/// `habit`.
pub fn toggle(habit: &Habit, date: CalendarDate) -> Habit {
    let mut updated = habit.clone();
    let outcome = updated.completion_log.toggle(date);
    tracing::debug!(habit = %habit.id(), %date, ?outcome, "toggled completion");
    updated
}

pub fn is_completed_on(habit: &Habit, date: CalendarDate) -> bool {
    habit.completion_log.contains(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::fixtures::{daily, date};

    fn logged(habit: &Habit) -> Vec<String> {
        habit.completion_log().iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn toggle_inserts_then_removes() {
        let habit = daily("h1");
        let once = toggle(&habit, date("2025-07-26"));
        assert_eq!(logged(&once), vec!["2025-07-26"]);
        assert!(is_completed_on(&once, date("2025-07-26")));

        let twice = toggle(&once, date("2025-07-26"));
        assert!(logged(&twice).is_empty());
        assert_eq!(twice, habit);
        assert!(habit.completion_log().is_empty(), "input is left untouched");
    }

    #[test]
    fn toggles_on_distinct_dates_commute() {
        let habit = daily("h1");
        let forward = toggle(&toggle(&habit, date("2025-07-26")), date("2025-07-27"));
        let reverse = toggle(&toggle(&habit, date("2025-07-27")), date("2025-07-26"));
        assert_eq!(forward.completion_log(), reverse.completion_log());
        assert_eq!(logged(&forward), vec!["2025-07-26", "2025-07-27"]);
        assert_eq!(logged(&reverse), vec!["2025-07-27", "2025-07-26"]);
    }

    #[test]
    fn three_toggles_equal_one() {
        let seeded = toggle(&daily("h1"), date("2025-07-01"));
        for raw in ["2025-07-01", "2025-07-02"] {
            let d = date(raw);
            let thrice = toggle(&toggle(&toggle(&seeded, d), d), d);
            assert_eq!(thrice, toggle(&seeded, d));
        }
    }

    #[test]
    fn removal_keeps_remaining_order() {
        let mut log = CompletionLog::new();
        for raw in ["2025-07-03", "2025-07-01", "2025-07-02"] {
            assert_eq!(log.toggle(date(raw)), Toggle::Completed);
        }
        assert_eq!(log.toggle(date("2025-07-01")), Toggle::Cleared);
        let remaining: Vec<String> = log.iter().map(|d| d.to_string()).collect();
        assert_eq!(remaining, vec!["2025-07-03", "2025-07-02"]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn rejects_duplicate_entries_on_decode() {
        let ok: CompletionLog = serde_json::from_str(r#"["2025-07-26","2025-07-27"]"#).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(serde_json::from_str::<CompletionLog>(r#"["2025-07-26","2025-07-26"]"#).is_err());
        assert!(serde_json::from_str::<CompletionLog>(r#"["26/07/2025"]"#).is_err());
    }
}
