use anyhow::{bail, Context, Result};
use city_cli::{config::Config, replay, report};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "city-cli")]
#[command(about = "Private City ledger tool", version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a script of operations and print the final state
    Replay {
        /// JSON array of operations
        script: PathBuf,

        /// Keep going after a rejected operation
        #[arg(long)]
        keep_going: bool,
    },

    /// Replay a script and fail unless every operation succeeds and all
    /// invariants hold
    Check {
        /// JSON array of operations
        script: PathBuf,
    },

    /// Print a sample script
    Example,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_error) = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
        None => (Config::default(), None),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log.level))
        .init();

    if let Some(e) = config_error {
        log::warn!("Could not load config: {}, using defaults", e);
    }

    let json = cli.json || config.output.json;

    match cli.command {
        Commands::Replay { script, keep_going } => {
            let operations = replay::load_script(&script)?;
            let stop_on_error = config.replay.stop_on_error && !keep_going;
            let result = replay::replay(operations, stop_on_error);
            print_report(&result, json)?;
        }

        Commands::Check { script } => {
            let operations = replay::load_script(&script)?;
            let result = replay::replay(operations, true);
            print_report(&result, json)?;

            if let Some(rejection) = result.rejected.first() {
                bail!(
                    "operation #{} ({}) rejected: {}",
                    rejection.index,
                    rejection.operation.kind(),
                    rejection.error
                );
            }
            result
                .ledger
                .check_invariants()
                .context("ledger invariants violated")?;
            log::info!("All invariants hold");
        }

        Commands::Example => {
            let script = serde_json::to_string_pretty(&replay::example_script())?;
            println!("{}", script);
        }
    }

    Ok(())
}

fn print_report(result: &replay::ReplayReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report::render_json(result)?);
    } else {
        println!("{}", report::render_text(result));
    }
    Ok(())
}
