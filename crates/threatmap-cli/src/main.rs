use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use threatmap_cli::output::OutputFormat;

mod commands;

#[derive(Parser, Debug)]
#[command(author, version, about = "Threat tracking and evacuation planning utilities")]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Path to the threat store JSON file (defaults to THREATMAP_DATA_PATH or
    /// the platform data directory).
    #[arg(long, global = true)]
    pub data_path: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the hazard zones for a yield.
    Zones {
        /// Yield in kilograms.
        #[arg(long = "yield-kg", allow_negative_numbers = true)]
        yield_kg: f64,
    },
    /// Inspect and manage stored threats.
    Threats {
        #[command(subcommand)]
        action: commands::threats::ThreatsAction,
    },
    /// Plan an evacuation route from a position.
    Evacuate(commands::evacuate::EvacuateArgs),
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Zones { yield_kg } => commands::zones::handle_zones(&cli.global, yield_kg),
        Command::Threats { action } => commands::threats::handle_threats(&cli.global, action),
        Command::Evacuate(args) => commands::evacuate::handle_evacuate(&cli.global, &args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
