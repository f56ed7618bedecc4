// Each module handles one CLI subcommand; main.rs only parses and dispatches.

pub mod evacuate;
pub mod threats;
pub mod zones;

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use threatmap_lib::{default_store_path, ThreatStore};

use crate::GlobalOptions;

const DATA_PATH_ENV: &str = "THREATMAP_DATA_PATH";

/// Resolve the store file: `--data-path`, then `THREATMAP_DATA_PATH`, then
/// the platform data directory.
pub fn resolve_store_path(global: &GlobalOptions) -> Result<PathBuf> {
    if let Some(path) = &global.data_path {
        return Ok(path.clone());
    }
    if let Ok(path) = env::var(DATA_PATH_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    default_store_path().context("failed to resolve the default threat store location")
}

pub fn open_store(global: &GlobalOptions) -> Result<ThreatStore> {
    let path = resolve_store_path(global)?;
    ThreatStore::open(&path)
        .with_context(|| format!("failed to open threat store at {}", path.display()))
}
