//! Zones command handler.

use anyhow::{ensure, Result};

use threatmap_cli::output::{format_zones_text, to_json, OutputFormat};
use threatmap_lib::compute_zones;

use crate::GlobalOptions;

pub fn handle_zones(global: &GlobalOptions, yield_kg: f64) -> Result<()> {
    ensure!(yield_kg.is_finite(), "yield must be a finite number");

    let zones = compute_zones(yield_kg);
    match global.format {
        OutputFormat::Json => println!("{}", to_json(&zones)?),
        OutputFormat::Text => print!("{}", format_zones_text(yield_kg, &zones)),
    }
    Ok(())
}
