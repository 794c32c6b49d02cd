//! Due-ness of a single habit on a single date.

use crate::date::CalendarDate;
use crate::error::HabitResult;
use crate::habit::{Frequency, Habit};

/// Whether the habit's recurrence rule selects `date`. The lifetime window
/// is not consulted here.
pub fn is_scheduled_on(habit: &Habit, date: CalendarDate) -> HabitResult<bool> {
    habit.validate_schedule()?;
    Ok(match habit.frequency {
        Frequency::Daily => true,
        Frequency::Weekly => {
            let abbrev = date.weekday_abbrev();
            habit.days.iter().any(|day| day == abbrev)
        }
    })
}

/// Whether `date` falls inside `[created_at, stopped_at]`. A missing bound
/// leaves that side open.
pub fn is_within_lifetime(habit: &Habit, date: CalendarDate) -> HabitResult<bool> {
    habit.validate_lifetime()?;
    let after_created = habit.created_at().map_or(true, |created| date >= created);
    let before_stopped = habit.stopped_at().map_or(true, |stopped| date <= stopped);
    Ok(after_created && before_stopped)
}

/// Scheduled and within lifetime. Fails on any broken invariant of the
/// definition, the same check calendar markers apply.
pub fn is_due(habit: &Habit, date: CalendarDate) -> HabitResult<bool> {
    habit.validate()?;
    Ok(is_scheduled_on(habit, date)? && is_within_lifetime(habit, date)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HabitError;
    use crate::habit::fixtures::{daily, date, unbounded_daily, weekly, with_lifetime};

    #[test]
    fn daily_habits_are_scheduled_every_day() {
        let habit = unbounded_daily("d");
        let mut cursor = date("2024-12-25");
        for _ in 0..400 {
            assert!(is_scheduled_on(&habit, cursor).unwrap());
            assert!(is_due(&habit, cursor).unwrap());
            cursor = cursor.succ().unwrap();
        }
    }

    #[test]
    fn weekly_habits_follow_listed_weekdays() {
        let habit = weekly("w", &["Mon", "Wed"]);
        assert!(is_scheduled_on(&habit, date("2025-07-28")).unwrap());
        assert!(!is_scheduled_on(&habit, date("2025-07-29")).unwrap());
        assert!(is_scheduled_on(&habit, date("2025-07-30")).unwrap());
        assert!(!is_scheduled_on(&habit, date("2025-08-03")).unwrap());
    }

    #[test]
    fn lifetime_bounds_are_inclusive() {
        let habit = with_lifetime(daily("d"), Some("2025-07-01"), Some("2025-07-31"));
        assert!(is_within_lifetime(&habit, date("2025-07-01")).unwrap());
        assert!(is_within_lifetime(&habit, date("2025-07-31")).unwrap());
        assert!(!is_within_lifetime(&habit, date("2025-06-30")).unwrap());
        assert!(!is_within_lifetime(&habit, date("2025-08-01")).unwrap());
    }

    #[test]
    fn missing_bounds_are_open() {
        let open_start = with_lifetime(daily("d"), None, Some("2025-07-31"));
        assert!(is_within_lifetime(&open_start, date("1999-01-01")).unwrap());
        let open_end = with_lifetime(daily("d"), Some("2025-07-01"), None);
        assert!(is_within_lifetime(&open_end, date("2099-12-31")).unwrap());
    }

    #[test]
    fn due_requires_both_rule_and_window() {
        let habit = with_lifetime(weekly("w", &["Mon"]), Some("2025-07-01"), Some("2025-07-31"));
        assert!(is_due(&habit, date("2025-07-28")).unwrap());
        assert!(!is_due(&habit, date("2025-07-29")).unwrap());
        assert!(!is_due(&habit, date("2025-08-04")).unwrap());
    }

    #[test]
    fn broken_definitions_fail() {
        let mut habit = weekly("w", &["Mon"]);
        habit.days.clear();
        assert!(matches!(
            is_scheduled_on(&habit, date("2025-07-28")),
            Err(HabitError::InvalidHabitDefinition { .. })
        ));

        let inverted = with_lifetime(daily("d"), Some("2025-08-01"), Some("2025-07-01"));
        assert!(matches!(
            is_within_lifetime(&inverted, date("2025-07-15")),
            Err(HabitError::InvalidHabitDefinition { .. })
        ));

        let mut unnamed = daily("n");
        unnamed.name.clear();
        assert!(is_scheduled_on(&unnamed, date("2025-07-28")).unwrap());
        assert!(matches!(
            is_due(&unnamed, date("2025-07-28")),
            Err(HabitError::InvalidHabitDefinition { .. })
        ));
    }
}
