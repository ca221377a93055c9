//! `nowplaying` command line: scenario replay and configuration inspection.

use std::{error::Error, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use nowplaying::{
    cli::{
        Scenario,
        formatting::{format_entry, format_error},
        replay,
    },
    config::Config,
    tracing_config,
};

#[derive(Parser)]
#[command(name = "nowplaying")]
#[command(about = "Follow the current media session")]
struct Cli {
    /// Also write logs to the rolling log file
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario against the in-memory session manager and print every event
    Replay {
        /// Scenario file
        scenario: PathBuf,

        /// Print JSON lines instead of styled text
        #[arg(long)]
        json: bool,
    },

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Print the configuration JSON schema
    Schema,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format_error(&e.to_string()));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    let _guard = if cli.log_file {
        Some(tracing_config::init_with_file(config.general.log_level)?)
    } else {
        tracing_config::init(config.general.log_level)?;
        None
    };

    match cli.command {
        Commands::Replay { scenario, json } => {
            let scenario = Scenario::load(&scenario)?;
            let entries = replay(&scenario, &config.media.denylist).await?;

            for entry in &entries {
                if json {
                    println!("{}", serde_json::to_string(entry)?);
                } else {
                    println!("{}", format_entry(entry));
                }
            }
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => print!("{}", toml::to_string_pretty(&config)?),
            ConfigCommands::Schema => {
                let schema = schemars::schema_for!(Config);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
        },
    }

    Ok(())
}
