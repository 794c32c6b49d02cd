use serde::Serialize;
use tracing::instrument;

use crate::calendar::CalendarMarkIndex;
use crate::completion;
use crate::date::CalendarDate;
use crate::due::{self, DueHabits};
use crate::error::{HabitError, HabitResult};
use crate::habit::{Habit, NewHabit};
use crate::store::{HabitStore, MemoryStore, OwnerHabits, Versioned};

pub const DEFAULT_TOGGLE_RETRY_LIMIT: usize = 3;

/// Everything a day view needs: the due list and the calendar markers.
#[derive(Debug, Clone, Serialize)]
pub struct HabitSnapshot {
    pub due: DueHabits,
    pub calendar: CalendarMarkIndex,
}

/// Owner-scoped entry point that runs the engine over a [`HabitStore`].
pub struct HabitService {
    store: Box<dyn HabitStore>,
    toggle_retry_limit: usize,
}

pub struct HabitServiceBuilder {
    store: Option<Box<dyn HabitStore>>,
    toggle_retry_limit: usize,
}

impl HabitServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            toggle_retry_limit: DEFAULT_TOGGLE_RETRY_LIMIT,
        }
    }

    pub fn with_store(mut self, store: Box<dyn HabitStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attempts made by a write before a version conflict is surfaced.
    pub fn toggle_retry_limit(mut self, limit: usize) -> Self {
        self.toggle_retry_limit = limit.max(1);
        self
    }

    pub fn build(self) -> HabitService {
        HabitService {
            store: self
                .store
                .unwrap_or_else(|| Box::new(MemoryStore::new())),
            toggle_retry_limit: self.toggle_retry_limit,
        }
    }
}

impl Default for HabitServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitService {
    pub fn builder() -> HabitServiceBuilder {
        HabitServiceBuilder::new()
    }

    #[instrument(skip(self))]
    pub fn create_habit(
        &self,
        owner_id: &str,
        request: NewHabit,
        today: CalendarDate,
    ) -> HabitResult<Habit> {
        let stored = self.store.insert(owner_id, request, today)?;
        tracing::info!(habit = %stored.value.id(), "habit created");
        Ok(stored.into_inner())
    }

    /// The owner's decodable habits. Documents the store could not decode
    /// are only reported by the batch queries.
    pub fn habits(&self, owner_id: &str) -> HabitResult<Vec<Habit>> {
        Ok(self.store.list_by_owner(owner_id)?.into_habits())
    }

    pub fn habit(&self, owner_id: &str, habit_id: &str) -> HabitResult<Habit> {
        self.owned_habit(owner_id, habit_id).map(Versioned::into_inner)
    }

    #[instrument(skip(self))]
    pub fn due_on(&self, owner_id: &str, date: CalendarDate) -> HabitResult<DueHabits> {
        let listing = self.store.list_by_owner(owner_id)?;
        Ok(Self::due_from(listing, owner_id, date))
    }

    #[instrument(skip(self))]
    pub fn calendar(&self, owner_id: &str) -> HabitResult<CalendarMarkIndex> {
        let listing = self.store.list_by_owner(owner_id)?;
        Ok(Self::calendar_from(listing))
    }

    /// Due list and calendar markers from one read of the store.
    pub fn snapshot(&self, owner_id: &str, date: CalendarDate) -> HabitResult<HabitSnapshot> {
        let listing = self.store.list_by_owner(owner_id)?;
        Ok(HabitSnapshot {
            due: Self::due_from(listing.clone(), owner_id, date),
            calendar: Self::calendar_from(listing),
        })
    }

    /// Flip `date` in the habit's completion log and write it back.
    ///
    /// The write only lands if nobody else wrote the habit since it was
    /// read. On conflict the toggle is re-applied to a fresh read.
    #[instrument(skip(self))]
    pub fn toggle_completion(
        &self,
        owner_id: &str,
        habit_id: &str,
        date: CalendarDate,
    ) -> HabitResult<Habit> {
        self.update_habit(owner_id, habit_id, |habit| {
            Ok(completion::toggle(habit, date))
        })
    }

    #[instrument(skip(self))]
    pub fn stop_habit(
        &self,
        owner_id: &str,
        habit_id: &str,
        date: CalendarDate,
    ) -> HabitResult<Habit> {
        self.update_habit(owner_id, habit_id, |habit| {
            let mut stopped = habit.clone();
            stopped.stop(date)?;
            Ok(stopped)
        })
    }
}

impl HabitService {
    fn due_from(listing: OwnerHabits, owner_id: &str, date: CalendarDate) -> DueHabits {
        let (habits, skipped) = listing.into_parts();
        let mut due = due::due_on(&habits, owner_id, date);
        due.record_skipped(skipped);
        due
    }

    fn calendar_from(listing: OwnerHabits) -> CalendarMarkIndex {
        let (habits, skipped) = listing.into_parts();
        let mut calendar = CalendarMarkIndex::build(&habits);
        calendar.record_skipped(skipped);
        calendar
    }

    fn owned_habit(&self, owner_id: &str, habit_id: &str) -> HabitResult<Versioned<Habit>> {
        let stored = self
            .store
            .get(habit_id)?
            .ok_or_else(|| HabitError::HabitNotFound(habit_id.to_string()))?;
        if stored.value.owner_id() != owner_id {
            return Err(HabitError::NotOwner {
                id: habit_id.to_string(),
                owner: owner_id.to_string(),
            });
        }
        Ok(stored)
    }

    fn update_habit<F>(&self, owner_id: &str, habit_id: &str, apply: F) -> HabitResult<Habit>
    where
        F: Fn(&Habit) -> HabitResult<Habit>,
    {
        let mut attempt = 1;
        loop {
            let current = self.owned_habit(owner_id, habit_id)?;
            let updated = apply(&current.value)?;
            match self.store.replace(updated, current.version) {
                Ok(stored) => return Ok(stored.into_inner()),
                Err(HabitError::VersionConflict { .. }) if attempt < self.toggle_retry_limit => {
                    tracing::debug!(habit = habit_id, attempt, "concurrent write, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::completion::is_completed_on;
    use crate::habit::fixtures::{date, weekly};

    const OWNER: &str = "owner-1";

    /// Lets another writer slip in before the first `interfering` replaces.
    struct RacingStore {
        inner: MemoryStore,
        interfering: AtomicUsize,
        other_date: CalendarDate,
    }

    impl HabitStore for RacingStore {
        fn insert(
            &self,
            owner_id: &str,
            request: NewHabit,
            created_at: CalendarDate,
        ) -> HabitResult<Versioned<Habit>> {
            self.inner.insert(owner_id, request, created_at)
        }

        fn get(&self, id: &str) -> HabitResult<Option<Versioned<Habit>>> {
            self.inner.get(id)
        }

        fn list_by_owner(&self, owner_id: &str) -> HabitResult<OwnerHabits> {
            self.inner.list_by_owner(owner_id)
        }

        fn replace(&self, habit: Habit, expected_version: u64) -> HabitResult<Versioned<Habit>> {
            if self.interfering.load(Ordering::SeqCst) > 0 {
                self.interfering.fetch_sub(1, Ordering::SeqCst);
                let current = self.inner.get(habit.id())?.expect("habit stored");
                let other = completion::toggle(&current.value, self.other_date);
                self.inner.replace(other, current.version)?;
            }
            self.inner.replace(habit, expected_version)
        }
    }

    fn racing_service(interfering: usize, retry_limit: usize) -> (HabitService, String) {
        let store = RacingStore {
            inner: MemoryStore::new(),
            interfering: AtomicUsize::new(interfering),
            other_date: date("2025-07-27"),
        };
        let habit = store
            .insert(OWNER, NewHabit::daily("Read"), date("2025-07-01"))
            .unwrap();
        let service = HabitService::builder()
            .with_store(Box::new(store))
            .toggle_retry_limit(retry_limit)
            .build();
        (service, habit.value.id().to_string())
    }

    #[test]
    fn create_then_query_due_and_calendar() {
        let service = HabitService::builder().build();
        let today = date("2025-07-28");
        let weekly = service
            .create_habit(OWNER, NewHabit::weekly("Gym", ["Mon"]), today)
            .unwrap();
        let daily = service
            .create_habit(OWNER, NewHabit::daily("Read"), today)
            .unwrap();

        let due = service.due_on(OWNER, today).unwrap();
        let names: Vec<&str> = due.habits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Read", "Gym"]);
        assert!(service.due_on(OWNER, date("2025-07-27")).unwrap().is_empty());

        service.toggle_completion(OWNER, daily.id(), today).unwrap();
        service.toggle_completion(OWNER, weekly.id(), today).unwrap();
        let snapshot = service.snapshot(OWNER, today).unwrap();
        assert_eq!(snapshot.calendar.len(), 1);
        assert!(snapshot.calendar.is_marked(today));
        assert!(snapshot.due.habits.iter().all(|h| is_completed_on(h, today)));
    }

    #[test]
    fn toggle_survives_a_concurrent_write() {
        let (service, id) = racing_service(1, DEFAULT_TOGGLE_RETRY_LIMIT);
        let habit = service
            .toggle_completion(OWNER, &id, date("2025-07-26"))
            .unwrap();
        assert!(is_completed_on(&habit, date("2025-07-26")));
        assert!(
            is_completed_on(&habit, date("2025-07-27")),
            "the interleaved toggle must not be lost"
        );
    }

    #[test]
    fn toggle_gives_up_after_retry_limit() {
        let (service, id) = racing_service(5, 2);
        assert!(matches!(
            service.toggle_completion(OWNER, &id, date("2025-07-26")),
            Err(HabitError::VersionConflict { .. })
        ));
    }

    #[test]
    fn parallel_toggles_are_all_kept() {
        let store = MemoryStore::new();
        let habit = store
            .insert(OWNER, NewHabit::daily("Read"), date("2025-07-01"))
            .unwrap();
        let id = habit.value.id().to_string();
        let service = Arc::new(
            HabitService::builder()
                .with_store(Box::new(store))
                .toggle_retry_limit(16)
                .build(),
        );

        let handles: Vec<_> = (1..=8)
            .map(|day| {
                let service = Arc::clone(&service);
                let id = id.clone();
                thread::spawn(move || {
                    let date = CalendarDate::from_ymd(2025, 7, day).unwrap();
                    service.toggle_completion(OWNER, &id, date).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("toggle thread");
        }

        let habit = service.habit(OWNER, &id).unwrap();
        assert_eq!(habit.completion_log().len(), 8);
    }

    #[test]
    fn operations_are_scoped_to_owner() {
        let service = HabitService::builder()
            .with_store(Box::new(MemoryStore::with_habits([weekly("w", &["Mon"])])))
            .build();
        assert!(matches!(
            service.toggle_completion("intruder", "w", date("2025-07-28")),
            Err(HabitError::NotOwner { .. })
        ));
        assert!(matches!(
            service.toggle_completion(OWNER, "missing", date("2025-07-28")),
            Err(HabitError::HabitNotFound(_))
        ));
        assert!(service.habits("intruder").unwrap().is_empty());
    }

    #[test]
    fn stop_habit_ends_due_window() {
        let service = HabitService::builder().build();
        let habit = service
            .create_habit(OWNER, NewHabit::daily("Read"), date("2025-07-01"))
            .unwrap();
        service
            .stop_habit(OWNER, habit.id(), date("2025-07-10"))
            .unwrap();

        assert_eq!(service.due_on(OWNER, date("2025-07-10")).unwrap().habits.len(), 1);
        assert!(service.due_on(OWNER, date("2025-07-11")).unwrap().is_empty());
        assert!(matches!(
            service.stop_habit(OWNER, habit.id(), date("2025-07-12")),
            Err(HabitError::HabitAlreadyStopped { .. })
        ));
    }
}
