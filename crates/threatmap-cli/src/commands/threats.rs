//! Threat store management subcommands.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Subcommand, ValueEnum};

use threatmap_cli::output::{format_threat_text, format_threats_text, to_json, OutputFormat};
use threatmap_lib::{calculate_expiry, demo_threats, Location, Threat, ThreatSource};

use super::open_store;
use crate::GlobalOptions;

#[derive(Subcommand, Debug)]
pub enum ThreatsAction {
    /// List stored threats (active only unless --all).
    List {
        /// Include threats whose expiry has passed.
        #[arg(long)]
        all: bool,
    },
    /// Add a threat.
    Add(AddArgs),
    /// Remove a threat by id.
    Remove {
        /// Threat id.
        id: String,
    },
    /// Drop expired and ephemeral threats as on service startup.
    Reconcile,
    /// Remove all ephemeral threats.
    Clear,
    /// Replace ephemeral threats with the demo scenario.
    SeedDemo,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Short name of the incident.
    #[arg(long)]
    pub name: String,
    /// Latitude in decimal degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,
    /// Longitude in decimal degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,
    /// Yield in kilograms.
    #[arg(long = "yield-kg", default_value_t = 1.0)]
    pub yield_kg: f64,
    /// Human-readable place name.
    #[arg(long, default_value = "")]
    pub location_name: String,
    #[arg(long, default_value = "")]
    pub details: String,
    /// Minutes until the threat expires; 0 means never.
    #[arg(long, default_value_t = 0)]
    pub duration_minutes: i64,
    #[arg(long, value_enum, default_value_t = SourceArg::Admin)]
    pub source: SourceArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SourceArg {
    Admin,
    SimulationNews,
    Demo,
    Simulator,
}

impl From<SourceArg> for ThreatSource {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Admin => ThreatSource::Admin,
            SourceArg::SimulationNews => ThreatSource::SimulationNews,
            SourceArg::Demo => ThreatSource::Demo,
            SourceArg::Simulator => ThreatSource::Simulator,
        }
    }
}

pub fn handle_threats(global: &GlobalOptions, action: ThreatsAction) -> Result<()> {
    let store = open_store(global)?;
    let format = global.format;

    match action {
        ThreatsAction::List { all } => {
            let threats = store.list(all);
            match format {
                OutputFormat::Json => println!("{}", to_json(&threats)?),
                OutputFormat::Text => print!("{}", format_threats_text(&threats, Utc::now())),
            }
        }
        ThreatsAction::Add(args) => {
            let now = Utc::now();
            let expires_at = calculate_expiry(now, args.duration_minutes)
                .context("invalid --duration-minutes")?;
            let mut threat = Threat::new(
                String::new(),
                args.name,
                Location::new(args.lat, args.lng),
                args.yield_kg,
            )
            .with_source(args.source.into())
            .with_expiry(expires_at);
            threat.location_name = args.location_name;
            threat.details = args.details;

            let added = store.add(threat).context("failed to add threat")?;
            match format {
                OutputFormat::Json => println!("{}", to_json(&added)?),
                OutputFormat::Text => print!("{}", format_threat_text(&added)),
            }
        }
        ThreatsAction::Remove { id } => {
            if !store.remove(&id).context("failed to remove threat")? {
                bail!("no removable threat with id '{id}'");
            }
            match format {
                OutputFormat::Json => {
                    println!("{}", to_json(&serde_json::json!({ "removed": id }))?)
                }
                OutputFormat::Text => println!("Removed threat {id}"),
            }
        }
        ThreatsAction::Reconcile => {
            let report = store
                .reconcile_on_startup()
                .context("failed to reconcile threat store")?;
            match format {
                OutputFormat::Json => println!("{}", to_json(&report)?),
                OutputFormat::Text => println!(
                    "Reconciled: {} before, {} expired removed, {} ephemeral removed, sentinel {}, {} remaining",
                    report.total_before,
                    report.removed_expired,
                    report.removed_ephemeral,
                    if report.seeded { "re-seeded" } else { "present" },
                    report.total_after
                ),
            }
        }
        ThreatsAction::Clear => {
            let report = store
                .clear_ephemeral()
                .context("failed to clear ephemeral threats")?;
            match format {
                OutputFormat::Json => println!("{}", to_json(&report)?),
                OutputFormat::Text => println!(
                    "Cleared {} ephemeral threats ({} remaining)",
                    report.removed, report.remaining
                ),
            }
        }
        ThreatsAction::SeedDemo => {
            let report = store
                .seed_demo(demo_threats(Utc::now()))
                .context("failed to seed demo threats")?;
            match format {
                OutputFormat::Json => println!("{}", to_json(&report)?),
                OutputFormat::Text => println!(
                    "Seeded {} demo threats ({} total)",
                    report.added, report.total
                ),
            }
        }
    }

    Ok(())
}
