use clap::Parser;
use habit_app::app::{run, Cli};
use habit_app::config::{init_logging, AppConfig};

fn main() {
    init_logging();
    let cli = Cli::parse();
    let config = AppConfig::from_env().unwrap_or_default();
    if let Err(err) = run(config, cli) {
        eprintln!("habits: {err:#}");
        std::process::exit(1);
    }
}
