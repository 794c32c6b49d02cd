//! Plain-text renderings of the engine's outputs.

use std::fmt::Write;

use habit_core::{
    calendar::CalendarMarkIndex, completion::is_completed_on, due::DueHabits, CalendarDate,
    Frequency, Habit,
};

const WEEKDAY_HEADER: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

pub fn due_heading(date: CalendarDate) -> String {
    format!(
        "Habits for {} ({})",
        date.human_readable(),
        date.weekday_name()
    )
}

pub fn render_due(due: &DueHabits) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", due_heading(due.date));
    if due.is_empty() {
        let _ = writeln!(out, "No habits scheduled for this day.");
    }
    for habit in &due.habits {
        let done = if is_completed_on(habit, due.date) {
            "x"
        } else {
            " "
        };
        let _ = writeln!(
            out,
            "[{done}] {} ({}) {}",
            habit.name,
            habit.frequency.label(),
            habit.id()
        );
    }
    if !due.skipped.is_empty() {
        let _ = writeln!(out, "{} invalid habit(s) skipped", due.skipped.len());
    }
    out
}

pub fn render_habits(habits: &[Habit]) -> String {
    let mut out = String::new();
    if habits.is_empty() {
        let _ = writeln!(out, "No habits yet.");
    }
    for habit in habits {
        let schedule = match habit.frequency {
            Frequency::Daily => "daily".to_string(),
            Frequency::Weekly => format!("weekly on {}", habit.days.join(", ")),
        };
        let mut line = format!("{} {} ({schedule})", habit.id(), habit.name);
        if let Some(created) = habit.created_at() {
            let _ = write!(line, " since {created}");
        }
        if let Some(stopped) = habit.stopped_at() {
            let _ = write!(line, ", stopped {stopped}");
        }
        let _ = writeln!(out, "{line}");
    }
    out
}

/// Month grid with `*` on days that have a completion and brackets around
/// the selected day.
pub fn render_month(index: &CalendarMarkIndex, month: CalendarDate) -> String {
    let days = month.month_days();
    let mut out = String::new();
    let _ = writeln!(out, "{}", month.as_naive().format("%B %Y"));
    for name in WEEKDAY_HEADER {
        let _ = write!(out, " {name}  ");
    }
    out.push('\n');

    let Some(first) = days.first() else {
        return out;
    };
    let leading = first.weekday().num_days_from_monday() as usize;
    let mut column = 0;
    for _ in 0..leading {
        out.push_str("     ");
        column += 1;
    }
    for day in &days {
        let marker = index.get(*day);
        let selected = marker.is_some_and(|marker| marker.selected);
        let dot = if index.is_marked(*day) { '*' } else { ' ' };
        let (open, close) = if selected { ('[', ']') } else { (' ', ' ') };
        let _ = write!(out, "{open}{:>2}{dot}{close}", day.day());
        column += 1;
        if column % 7 == 0 {
            out.push('\n');
        }
    }
    if column % 7 != 0 {
        out.push('\n');
    }
    out
}
