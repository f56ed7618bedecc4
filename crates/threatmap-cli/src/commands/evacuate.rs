//! Evacuate command handler.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use clap::Args;
use tracing::{debug, warn};

use threatmap_cli::output::{format_evacuation_text, to_json, OutputFormat};
use threatmap_lib::{
    EvacuationConfig, EvacuationPlanner, FacilityCatalog, HttpAdvisor, Location, NoAdvisor,
    RankingAdvisor,
};

use super::open_store;
use crate::GlobalOptions;

const ADVISOR_URL_ENV: &str = "THREATMAP_ADVISOR_URL";
const FACILITIES_PATH_ENV: &str = "THREATMAP_FACILITIES_PATH";

#[derive(Args, Debug)]
pub struct EvacuateArgs {
    /// Current latitude in decimal degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,
    /// Current longitude in decimal degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,
    /// JSON file of candidate facilities (name, types, location).
    #[arg(long)]
    pub facilities: Option<PathBuf>,
    /// Base URL of the facility ranking service.
    #[arg(long)]
    pub advisor_url: Option<String>,
}

pub fn handle_evacuate(global: &GlobalOptions, args: &EvacuateArgs) -> Result<()> {
    let user = Location::new(args.lat, args.lng);
    ensure!(user.is_valid(), "location {user} is out of range");

    let store = open_store(global)?;
    let threats = store.list(false);
    let config = EvacuationConfig::from_env();

    let catalog = load_catalog(args.facilities.clone())?;
    let advisor = build_advisor(args.advisor_url.clone(), &config)?;
    let planner = EvacuationPlanner::new(Arc::new(catalog), advisor, config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let outcome = runtime.block_on(planner.plan(user, &threats));

    match global.format {
        OutputFormat::Json => println!("{}", to_json(&outcome)?),
        OutputFormat::Text => print!("{}", format_evacuation_text(&outcome)),
    }
    Ok(())
}

fn load_catalog(path: Option<PathBuf>) -> Result<FacilityCatalog> {
    let path = path.or_else(|| env::var(FACILITIES_PATH_ENV).ok().map(PathBuf::from));
    match path {
        Some(path) => FacilityCatalog::from_path(&path)
            .with_context(|| format!("failed to load facilities from {}", path.display())),
        None => {
            warn!("no facility catalog configured; only the safe exit point can be offered");
            Ok(FacilityCatalog::new(Vec::new()))
        }
    }
}

fn build_advisor(
    url: Option<String>,
    config: &EvacuationConfig,
) -> Result<Arc<dyn RankingAdvisor>> {
    let url = url.or_else(|| env::var(ADVISOR_URL_ENV).ok());
    match url {
        Some(url) => {
            debug!(%url, "using HTTP ranking advisor");
            let advisor = HttpAdvisor::new(&url, config.collaborator_timeout)
                .context("failed to build advisor client")?;
            Ok(Arc::new(advisor))
        }
        None => Ok(Arc::new(NoAdvisor)),
    }
}
