//! Per-date completion markers for calendar rendering.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::date::CalendarDate;
use crate::due::SkippedHabit;
use crate::habit::Habit;

/// Dot colour for dates with at least one completion.
pub const DOT_COLOR: &str = "#5C6BC0";
/// Highlight colour for the selected date.
pub const SELECTED_COLOR: &str = "#5C6BC0";

/// Annotation for one calendar day. A marker records that some habit was
/// completed that day, not how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub marked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dot_color: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<&'static str>,
}

impl Marker {
    pub fn completed() -> Self {
        Self {
            marked: true,
            dot_color: Some(DOT_COLOR),
            selected: false,
            selected_color: None,
        }
    }

    fn select(mut self) -> Self {
        self.selected = true;
        self.selected_color = Some(SELECTED_COLOR);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalendarMarkIndex {
    markers: BTreeMap<CalendarDate, Marker>,
    #[serde(skip)]
    skipped: Vec<SkippedHabit>,
}

impl CalendarMarkIndex {
    /// Fold every habit's completion log into one marker per date.
    pub fn build<'a, I>(habits: I) -> Self
    where
        I: IntoIterator<Item = &'a Habit>,
    {
        let mut index = Self::default();
        for habit in habits {
            if let Err(err) = habit.validate() {
                index.skipped.push(SkippedHabit::from_error(habit, &err));
                continue;
            }
            for date in habit.completion_log() {
                index.markers.insert(*date, Marker::completed());
            }
        }
        if !index.skipped.is_empty() {
            tracing::warn!(
                skipped = index.skipped.len(),
                "calendar markers built without invalid entries"
            );
        }
        index
    }

    pub fn get(&self, date: CalendarDate) -> Option<&Marker> {
        self.markers.get(&date)
    }

    pub fn is_marked(&self, date: CalendarDate) -> bool {
        self.markers.get(&date).is_some_and(|marker| marker.marked)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Markers in date order.
    pub fn iter(&self) -> impl Iterator<Item = (&CalendarDate, &Marker)> {
        self.markers.iter()
    }

    pub fn skipped(&self) -> &[SkippedHabit] {
        &self.skipped
    }

    pub(crate) fn record_skipped(&mut self, skipped: impl IntoIterator<Item = SkippedHabit>) {
        self.skipped.extend(skipped);
    }

    /// Copy of the index with `date` highlighted. An existing completion
    /// marker keeps its dot.
    pub fn with_selection(&self, date: CalendarDate) -> Self {
        let mut selected = self.clone();
        let marker = selected.markers.get(&date).copied().unwrap_or(Marker {
            marked: false,
            dot_color: None,
            selected: false,
            selected_color: None,
        });
        selected.markers.insert(date, marker.select());
        selected
    }
}
