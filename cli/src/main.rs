use std::path::PathBuf;

use clap::{Parser, Subcommand};
use meter_cli::{ReplayOptions, commands, logging};
use meter_core::{StatisticsConfig, StatisticsConfigExt};

#[derive(Parser)]
#[command(version, about = "Combat statistics from recorded battle logs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines event log and print per-entity statistics
    Replay {
        path: PathBuf,
        /// Section timeout in seconds (overrides the config file)
        #[arg(short, long)]
        timeout: Option<f64>,
        /// Report the whole session instead of the last section
        #[arg(long, conflicts_with = "section")]
        full: bool,
        #[arg(long)]
        section: bool,
        #[arg(long)]
        json: bool,
        /// Ignore the config file and use defaults
        #[arg(long)]
        defaults: bool,
    },
    /// Print the effective configuration
    Config {
        /// Write the configuration file (creating it with defaults)
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), String> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            path,
            timeout,
            full,
            section: _,
            json,
            defaults,
        } => {
            let mut config = if defaults {
                StatisticsConfig::default()
            } else {
                StatisticsConfig::load().map_err(|e| e.to_string())?
            };
            if let Some(secs) = timeout {
                config.section_timeout_secs = secs;
            }
            let options = ReplayOptions { config, full };
            let report = commands::replay(&path, &options).await?;
            commands::print_replay(&report, full, json)
        }
        Commands::Config { save } => commands::show_config(save),
    }
}
