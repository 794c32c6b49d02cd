use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use habit_core::{service::DEFAULT_TOGGLE_RETRY_LIMIT, CalendarDate};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_DATA_PATH: &str = "habits.json";
const DEFAULT_OWNER_ID: &str = "local";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_path: PathBuf,
    pub(crate) owner_id: String,
    pub(crate) today: Option<CalendarDate>,
    pub(crate) toggle_retry_limit: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("HABITS_DATA_PATH") {
            if !path.trim().is_empty() {
                config.data_path = PathBuf::from(path.trim());
            }
        }
        if let Some(owner) = lookup("HABITS_OWNER_ID") {
            config.set_owner(owner);
        }
        if let Some(today) = lookup("HABITS_TODAY") {
            match CalendarDate::parse(today.trim()) {
                Ok(date) => config.today = Some(date),
                Err(err) => warn!(%err, "ignoring HABITS_TODAY"),
            }
        }
        if let Some(retries) = lookup("HABITS_TOGGLE_RETRIES") {
            match retries.trim().parse::<usize>() {
                Ok(value) if value > 0 => config.toggle_retry_limit = value,
                _ => warn!(value = %retries, "ignoring HABITS_TOGGLE_RETRIES"),
            }
        }
        info!(path = %config.data_path.display(), owner = %config.owner_id, "configuration loaded");
        config
    }

    pub(crate) fn set_owner(&mut self, owner: String) {
        let owner = owner.trim();
        if !owner.is_empty() {
            self.owner_id = owner.to_string();
        }
    }

    pub(crate) fn set_data_path(&mut self, path: PathBuf) {
        self.data_path = path;
    }

    /// The injected "today", falling back to the local wall clock.
    pub fn today(&self) -> Result<CalendarDate> {
        match self.today {
            Some(date) => Ok(date),
            None => Ok(CalendarDate::from_naive(Local::now().date_naive())?),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            owner_id: DEFAULT_OWNER_ID.to_string(),
            today: None,
            toggle_retry_limit: DEFAULT_TOGGLE_RETRY_LIMIT,
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `HABITS_LOG_LEVEL`.
pub fn init_logging() {
    let level = std::env::var("HABITS_LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.into());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
