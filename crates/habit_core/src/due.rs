//! Which of an owner's habits are due on a date.

use serde::Serialize;

use crate::date::CalendarDate;
use crate::error::HabitError;
use crate::habit::{Frequency, Habit};
use crate::recurrence;

/// A habit left out of a batch because its definition is broken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedHabit {
    pub id: String,
    pub reason: String,
}

impl SkippedHabit {
    pub(crate) fn new(id: impl Into<String>, err: &HabitError) -> Self {
        let id = id.into();
        tracing::warn!(habit = %id, %err, "skipping invalid habit");
        Self {
            id,
            reason: err.to_string(),
        }
    }

    pub(crate) fn from_error(habit: &Habit, err: &HabitError) -> Self {
        Self::new(habit.id(), err)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DueHabits {
    pub date: CalendarDate,
    /// Daily habits first, then weekly ones, each group in source order.
    pub habits: Vec<Habit>,
    pub skipped: Vec<SkippedHabit>,
}

impl DueHabits {
    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    /// Append habits that were skipped before evaluation, e.g. by a store
    /// that could not decode them.
    pub(crate) fn record_skipped(&mut self, skipped: impl IntoIterator<Item = SkippedHabit>) {
        self.skipped.extend(skipped);
    }
}

/// Evaluate every habit of `owner_id` against `date`.
///
/// Habits of other owners are ignored. Habits whose definition fails
/// evaluation are reported in [`DueHabits::skipped`] instead of aborting
/// the batch.
pub fn due_on(habits: &[Habit], owner_id: &str, date: CalendarDate) -> DueHabits {
    let mut daily = Vec::new();
    let mut weekly = Vec::new();
    let mut skipped = Vec::new();

    for habit in habits.iter().filter(|habit| habit.owner_id() == owner_id) {
        match recurrence::is_due(habit, date) {
            Ok(true) => match habit.frequency {
                Frequency::Daily => daily.push(habit.clone()),
                Frequency::Weekly => weekly.push(habit.clone()),
            },
            Ok(false) => {}
            Err(err) => skipped.push(SkippedHabit::from_error(habit, &err)),
        }
    }

    if !skipped.is_empty() {
        tracing::warn!(%date, skipped = skipped.len(), "due habits computed without invalid entries");
    }

    daily.extend(weekly);
    DueHabits {
        date,
        habits: daily,
        skipped,
    }
}
