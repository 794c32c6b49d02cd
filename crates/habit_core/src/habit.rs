use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::completion::CompletionLog;
use crate::date::{is_weekday_abbrev, CalendarDate};
use crate::error::{HabitError, HabitResult};

/// Recurrence class of a habit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Daily Habit",
            Self::Weekly => "Weekly Habit",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = HabitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            other => Err(HabitError::InvalidNewHabit(format!(
                "unknown frequency `{other}`"
            ))),
        }
    }
}

/// Where a habit sits in its lifetime. There is no transition back from
/// `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Stopped(CalendarDate),
}

/// A recurring activity together with its completion history.
///
/// `id` and `owner_id` are fixed at creation. The completion log only
/// changes through [`crate::completion::toggle`], and `stopped_at` only
/// through [`Habit::stop`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    id: String,
    #[serde(rename = "userId", alias = "ownerId")]
    owner_id: String,
    pub name: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub(crate) completion_log: CompletionLog,
    #[serde(default)]
    created_at: Option<CalendarDate>,
    #[serde(default)]
    stopped_at: Option<CalendarDate>,
}

/// Creation request as submitted by the habit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub name: String,
    pub frequency: Frequency,
    pub days: Vec<String>,
}

impl NewHabit {
    pub fn daily(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frequency: Frequency::Daily,
            days: Vec::new(),
        }
    }

    pub fn weekly<I, S>(name: impl Into<String>, days: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            frequency: Frequency::Weekly,
            days: days.into_iter().map(Into::into).collect(),
        }
    }

    /// Trim the name, drop days for daily habits and de-duplicate the rest.
    fn normalized(self) -> HabitResult<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(HabitError::InvalidNewHabit("name must not be empty".into()));
        }
        let days = match self.frequency {
            Frequency::Daily => Vec::new(),
            Frequency::Weekly => {
                let mut days: Vec<String> = Vec::new();
                for day in self.days {
                    let day = day.trim().to_string();
                    if !is_weekday_abbrev(&day) {
                        return Err(HabitError::InvalidNewHabit(format!(
                            "unknown weekday `{day}`"
                        )));
                    }
                    if !days.contains(&day) {
                        days.push(day);
                    }
                }
                if days.is_empty() {
                    return Err(HabitError::InvalidNewHabit(
                        "weekly habits need at least one day".into(),
                    ));
                }
                days
            }
        };
        Ok(Self {
            name,
            frequency: self.frequency,
            days,
        })
    }
}

impl Habit {
    /// Build a freshly created habit: empty log, active, created on `created_at`.
    pub fn create(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        request: NewHabit,
        created_at: CalendarDate,
    ) -> HabitResult<Self> {
        let request = request.normalized()?;
        Ok(Self {
            id: id.into(),
            owner_id: owner_id.into(),
            name: request.name,
            frequency: request.frequency,
            days: request.days,
            completion_log: CompletionLog::new(),
            created_at: Some(created_at),
            stopped_at: None,
        })
    }

    /// Decode a store document. Shapes the model cannot hold (an unknown
    /// frequency, a non-canonical date, a repeated log entry) are reported
    /// as [`HabitError::InvalidHabitDefinition`].
    ///
    /// Older documents name the owner `ownerId`. When both keys are present
    /// `userId` wins.
    pub fn from_json(mut value: serde_json::Value) -> HabitResult<Self> {
        if let Some(document) = value.as_object_mut() {
            if document.contains_key("userId") {
                document.remove("ownerId");
            }
        }
        let id = value
            .get("id")
            .and_then(|id| id.as_str())
            .unwrap_or("<unknown>")
            .to_string();
        serde_json::from_value(value).map_err(|err| HabitError::invalid(id, err.to_string()))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn completion_log(&self) -> &CompletionLog {
        &self.completion_log
    }

    pub fn created_at(&self) -> Option<CalendarDate> {
        self.created_at
    }

    pub fn stopped_at(&self) -> Option<CalendarDate> {
        self.stopped_at
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.stopped_at {
            Some(date) => Lifecycle::Stopped(date),
            None => Lifecycle::Active,
        }
    }

    /// Close the lifetime window on `date` (inclusive).
    pub fn stop(&mut self, date: CalendarDate) -> HabitResult<()> {
        if let Some(stopped_at) = self.stopped_at {
            return Err(HabitError::HabitAlreadyStopped {
                id: self.id.clone(),
                stopped_at,
            });
        }
        if let Some(created_at) = self.created_at {
            if date < created_at {
                return Err(HabitError::StopBeforeCreation {
                    id: self.id.clone(),
                    date,
                    created_at,
                });
            }
        }
        self.stopped_at = Some(date);
        Ok(())
    }

    /// Check every invariant of the definition.
    pub fn validate(&self) -> HabitResult<()> {
        if self.name.trim().is_empty() {
            return Err(HabitError::invalid(&self.id, "name is empty"));
        }
        self.validate_schedule()?;
        self.validate_lifetime()
    }

    /// `days` must be non-empty exactly when the habit is weekly.
    pub(crate) fn validate_schedule(&self) -> HabitResult<()> {
        match self.frequency {
            Frequency::Daily if !self.days.is_empty() => Err(HabitError::invalid(
                &self.id,
                "daily habit must not list weekdays",
            )),
            Frequency::Weekly if self.days.is_empty() => Err(HabitError::invalid(
                &self.id,
                "weekly habit must list at least one weekday",
            )),
            _ => {
                for (idx, day) in self.days.iter().enumerate() {
                    if !is_weekday_abbrev(day) {
                        return Err(HabitError::invalid(
                            &self.id,
                            format!("unknown weekday `{day}`"),
                        ));
                    }
                    if self.days[..idx].contains(day) {
                        return Err(HabitError::invalid(
                            &self.id,
                            format!("weekday `{day}` listed twice"),
                        ));
                    }
                }
                Ok(())
            }
        }
    }

    pub(crate) fn validate_lifetime(&self) -> HabitResult<()> {
        match (self.created_at, self.stopped_at) {
            (Some(created), Some(stopped)) if created > stopped => Err(HabitError::invalid(
                &self.id,
                format!("created {created} after it was stopped on {stopped}"),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn date(raw: &str) -> CalendarDate {
        CalendarDate::parse(raw).unwrap()
    }

    pub fn daily(id: &str) -> Habit {
        Habit::create(id, "owner-1", NewHabit::daily(id), date("2025-01-01")).unwrap()
    }

    pub fn weekly(id: &str, days: &[&str]) -> Habit {
        Habit::create(
            id,
            "owner-1",
            NewHabit::weekly(id, days.iter().copied()),
            date("2025-01-01"),
        )
        .unwrap()
    }

    /// Same as [`daily`] but with no lifetime bounds at all.
    pub fn unbounded_daily(id: &str) -> Habit {
        let mut habit = daily(id);
        habit.created_at = None;
        habit
    }

    pub fn with_lifetime(
        mut habit: Habit,
        created_at: Option<&str>,
        stopped_at: Option<&str>,
    ) -> Habit {
        habit.created_at = created_at.map(date);
        habit.stopped_at = stopped_at.map(date);
        habit
    }
}
