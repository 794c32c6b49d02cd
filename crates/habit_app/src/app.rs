use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use habit_core::{
    completion::is_completed_on, store::JsonFileStore, CalendarDate, Frequency, HabitService,
    NewHabit,
};
use tracing::info;

use crate::config::AppConfig;
use crate::view;

#[derive(Parser, Debug)]
#[command(name = "habits")]
#[command(about = "Track daily and weekly habits from the terminal")]
pub struct Cli {
    /// Owner whose habits are shown (overrides HABITS_OWNER_ID)
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// JSON store file (overrides HABITS_DATA_PATH)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Habits due today
    Today,
    /// Every habit of the owner
    List,
    /// Month calendar with completion markers
    Calendar {
        /// Month to show as YYYY-MM (defaults to the current month)
        #[arg(long, value_parser = parse_month)]
        month: Option<CalendarDate>,

        /// Highlight a date and list the habits due on it
        #[arg(long)]
        select: Option<CalendarDate>,
    },
    /// Create a habit
    Add {
        name: String,

        #[arg(short, long, default_value = "daily")]
        frequency: Frequency,

        /// Weekday for weekly habits (Mon, Tue, ...), repeatable
        #[arg(short, long = "day")]
        days: Vec<String>,
    },
    /// Mark a habit done, or undo it
    Toggle {
        id: String,

        /// Date to toggle (defaults to today)
        #[arg(long)]
        date: Option<CalendarDate>,
    },
    /// Stop a habit; it stays due up to and including the stop date
    Stop {
        id: String,

        #[arg(long)]
        date: Option<CalendarDate>,
    },
}

fn parse_month(raw: &str) -> Result<CalendarDate, String> {
    CalendarDate::parse(&format!("{}-01", raw.trim()))
        .map_err(|_| format!("invalid month `{raw}`, expected YYYY-MM"))
}

pub fn run(mut config: AppConfig, cli: Cli) -> Result<()> {
    if let Some(owner) = cli.owner {
        config.set_owner(owner);
    }
    if let Some(path) = cli.data {
        config.set_data_path(path);
    }

    let store = JsonFileStore::open(&config.data_path)
        .with_context(|| format!("failed to open {}", config.data_path.display()))?;
    let service = HabitService::builder()
        .with_store(Box::new(store))
        .toggle_retry_limit(config.toggle_retry_limit)
        .build();
    let owner = config.owner_id.as_str();
    let today = config.today()?;
    info!(%owner, %today, command = ?cli.command, "running command");

    match cli.command {
        Command::Today => {
            let due = service.due_on(owner, today)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&due)?);
            } else {
                print!("{}", view::render_due(&due));
            }
        }
        Command::List => {
            let habits = service.habits(owner)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&habits)?);
            } else {
                print!("{}", view::render_habits(&habits));
            }
        }
        Command::Calendar { month, select } => {
            let selected = select.unwrap_or(today);
            let snapshot = service.snapshot(owner, selected)?;
            let month = month.or(select).unwrap_or(today);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                let index = snapshot.calendar.with_selection(selected);
                print!("{}", view::render_month(&index, month));
                println!();
                print!("{}", view::render_due(&snapshot.due));
            }
        }
        Command::Add {
            name,
            frequency,
            days,
        } => {
            let request = NewHabit {
                name,
                frequency,
                days,
            };
            let habit = service
                .create_habit(owner, request, today)
                .context("failed to create habit")?;
            println!("Created {} ({})", habit.name, habit.id());
        }
        Command::Toggle { id, date } => {
            let date = date.unwrap_or(today);
            let habit = service.toggle_completion(owner, &id, date)?;
            let state = if is_completed_on(&habit, date) {
                "done"
            } else {
                "not done"
            };
            println!("{} marked {state} for {date}", habit.name);
        }
        Command::Stop { id, date } => {
            let date = date.unwrap_or(today);
            let habit = service.stop_habit(owner, &id, date)?;
            println!("Stopped {} after {date}", habit.name);
        }
    }
    Ok(())
}
