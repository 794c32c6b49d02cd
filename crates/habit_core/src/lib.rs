pub mod calendar;
pub mod completion;
pub mod date;
pub mod due;
pub mod error;
pub mod habit;
pub mod recurrence;
pub mod service;
pub mod store;

pub use crate::date::CalendarDate;
pub use crate::error::{HabitError, HabitResult};
pub use crate::habit::{Frequency, Habit, NewHabit};
pub use crate::service::{HabitService, HabitServiceBuilder};
