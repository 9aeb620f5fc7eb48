use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "breakroom-cli", version, about = "Breakroom CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Break tier management
    Tier {
        #[command(subcommand)]
        action: commands::tier::TierAction,
    },
    /// Exception rule management
    Exception {
        #[command(subcommand)]
        action: commands::exception::ExceptionAction,
    },
    /// Break history
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Replay a scripted scenario and print the event stream
    Simulate {
        /// Scenario JSON file; omit for the built-in demo
        scenario: Option<PathBuf>,
        /// Print the whole report as one JSON document
        #[arg(long)]
        json: bool,
        /// Include opacity and countdown ticks
        #[arg(long)]
        full: bool,
    },
    /// Drive a live session in the foreground, printing events
    Run {
        /// Stop after this many seconds instead of running until Ctrl-C
        #[arg(long)]
        duration_secs: Option<u64>,
        /// Print every event, including opacity and countdown ticks
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "breakroom_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Tier { action } => commands::tier::run(action),
        Commands::Exception { action } => commands::exception::run(action),
        Commands::Log { action } => commands::log::run(action),
        Commands::Simulate {
            scenario,
            json,
            full,
        } => commands::simulate::run(scenario, json, full),
        Commands::Run {
            duration_secs,
            json,
        } => commands::run::run(duration_secs, json),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
