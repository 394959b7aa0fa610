use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "pomoflex-cli", version, about = "Pomoflex CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Drive the timer and print events until interrupted
    Watch,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// List recorded sessions
    History {
        /// today, week, month or all
        #[arg(long, default_value = "today")]
        range: pomoflex_core::HistoryRange,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Check stored data without modifying it
    Doctor,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Watch => commands::watch::run(),
        Commands::Config { action } => commands::config::run(action),
        Commands::History { range } => commands::stats::history(range),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Doctor => commands::doctor::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
