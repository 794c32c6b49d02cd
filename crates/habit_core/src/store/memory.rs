use parking_lot::RwLock;

use super::{check_replace, new_habit_id, HabitStore, OwnerHabits, Versioned};
use crate::date::CalendarDate;
use crate::error::{HabitError, HabitResult};
use crate::habit::{Habit, NewHabit};

/// Process-local store, mostly for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    habits: RwLock<Vec<Versioned<Habit>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store habits as-is, without validation, at version 1.
    pub fn with_habits(habits: impl IntoIterator<Item = Habit>) -> Self {
        let store = Self::new();
        store
            .habits
            .write()
            .extend(habits.into_iter().map(|habit| Versioned::new(1, habit)));
        store
    }

    pub fn len(&self) -> usize {
        self.habits.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.read().is_empty()
    }
}

impl HabitStore for MemoryStore {
    fn insert(
        &self,
        owner_id: &str,
        request: NewHabit,
        created_at: CalendarDate,
    ) -> HabitResult<Versioned<Habit>> {
        let habit = Habit::create(new_habit_id(), owner_id, request, created_at)?;
        let stored = Versioned::new(1, habit);
        self.habits.write().push(stored.clone());
        Ok(stored)
    }

    fn get(&self, id: &str) -> HabitResult<Option<Versioned<Habit>>> {
        Ok(self
            .habits
            .read()
            .iter()
            .find(|stored| stored.value.id() == id)
            .cloned())
    }

    fn list_by_owner(&self, owner_id: &str) -> HabitResult<OwnerHabits> {
        let habits = self
            .habits
            .read()
            .iter()
            .filter(|stored| stored.value.owner_id() == owner_id)
            .cloned()
            .collect();
        Ok(OwnerHabits {
            habits,
            skipped: Vec::new(),
        })
    }

    fn replace(&self, habit: Habit, expected_version: u64) -> HabitResult<Versioned<Habit>> {
        let mut habits = self.habits.write();
        let stored = habits
            .iter_mut()
            .find(|stored| stored.value.id() == habit.id())
            .ok_or_else(|| HabitError::HabitNotFound(habit.id().to_string()))?;
        check_replace(
            stored.value.owner_id(),
            stored.version,
            &habit,
            expected_version,
        )?;
        *stored = Versioned::new(stored.version + 1, habit);
        tracing::debug!(habit = %stored.value.id(), version = stored.version, "habit replaced");
        Ok(stored.clone())
    }
}
