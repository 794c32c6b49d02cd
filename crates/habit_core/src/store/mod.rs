//! Boundary to the document store that persists habits.
//!
//! The engine itself never does I/O. Adapters implement [`HabitStore`] and
//! hand back fully decoded habits together with the version they were read
//! at, so that writes can be made conditional on nothing having changed in
//! between.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde::Serialize;

use crate::date::CalendarDate;
use crate::due::SkippedHabit;
use crate::error::{HabitError, HabitResult};
use crate::habit::{Habit, NewHabit};

/// A stored value and the write counter it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Versioned<T> {
    pub version: u64,
    #[serde(flatten)]
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(version: u64, value: T) -> Self {
        Self { version, value }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// One owner's habits as read from a store.
///
/// Documents the store holds but cannot decode into a [`Habit`] are listed
/// in `skipped` so that batch queries can report them.
#[derive(Debug, Clone, Default)]
pub struct OwnerHabits {
    pub habits: Vec<Versioned<Habit>>,
    pub skipped: Vec<SkippedHabit>,
}

impl OwnerHabits {
    pub fn into_habits(self) -> Vec<Habit> {
        self.into_parts().0
    }

    pub fn into_parts(self) -> (Vec<Habit>, Vec<SkippedHabit>) {
        let habits = self.habits.into_iter().map(Versioned::into_inner).collect();
        (habits, self.skipped)
    }
}

/// Storage adapters implement this trait.
pub trait HabitStore: Send + Sync {
    /// Persist a new habit. The store assigns the id.
    fn insert(
        &self,
        owner_id: &str,
        request: NewHabit,
        created_at: CalendarDate,
    ) -> HabitResult<Versioned<Habit>>;

    fn get(&self, id: &str) -> HabitResult<Option<Versioned<Habit>>>;

    /// Every habit of `owner_id`, in store order.
    fn list_by_owner(&self, owner_id: &str) -> HabitResult<OwnerHabits>;

    /// Overwrite a habit, but only if it is still at `expected_version`.
    fn replace(&self, habit: Habit, expected_version: u64) -> HabitResult<Versioned<Habit>>;
}

pub(crate) fn new_habit_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Shared precondition of [`HabitStore::replace`].
pub(crate) fn check_replace(
    stored_owner: &str,
    stored_version: u64,
    habit: &Habit,
    expected_version: u64,
) -> HabitResult<()> {
    if stored_owner != habit.owner_id() {
        return Err(HabitError::NotOwner {
            id: habit.id().to_string(),
            owner: habit.owner_id().to_string(),
        });
    }
    if stored_version != expected_version {
        return Err(HabitError::VersionConflict {
            id: habit.id().to_string(),
            expected: expected_version,
            actual: stored_version,
        });
    }
    Ok(())
}
