//! Error types for the habit engine and its store adapters.

use thiserror::Error;

use crate::date::CalendarDate;

#[derive(Error, Debug)]
pub enum HabitError {
    #[error("malformed date `{0}`, expected YYYY-MM-DD")]
    MalformedDate(String),

    #[error("invalid habit definition `{id}`: {reason}")]
    InvalidHabitDefinition { id: String, reason: String },

    #[error("invalid new habit: {0}")]
    InvalidNewHabit(String),

    #[error("habit not found: {0}")]
    HabitNotFound(String),

    #[error("habit `{id}` does not belong to `{owner}`")]
    NotOwner { id: String, owner: String },

    #[error("habit `{id}` was already stopped on {stopped_at}")]
    HabitAlreadyStopped { id: String, stopped_at: CalendarDate },

    #[error("habit `{id}` cannot stop on {date}, before its creation on {created_at}")]
    StopBeforeCreation {
        id: String,
        date: CalendarDate,
        created_at: CalendarDate,
    },

    #[error("habit `{id}` changed concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HabitError {
    pub(crate) fn invalid(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHabitDefinition {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

pub type HabitResult<T> = Result<T, HabitError>;
