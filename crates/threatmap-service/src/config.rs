//! Environment-driven service configuration.
//!
//! | Variable | Default |
//! |---|---|
//! | `THREATMAP_DATA_PATH` | platform data dir `threats.json` |
//! | `SERVICE_PORT` | `8080` |
//! | `THREATMAP_FACILITIES_PATH` | unset (no facilities; safe exit only) |
//! | `THREATMAP_ADVISOR_URL` | unset (deterministic nearest-facility fallback) |
//! | `THREATMAP_NEWS_URL` | unset (ingestion disabled) |
//! | `THREATMAP_AI_URL` | unset (ingestion disabled) |
//! | `THREATMAP_COLLABORATOR_TIMEOUT_MS` | `10000` |

use std::env;
use std::path::PathBuf;

use threatmap_lib::{default_store_path, EvacuationConfig, Result as LibResult};

pub const DATA_PATH_ENV: &str = "THREATMAP_DATA_PATH";
pub const PORT_ENV: &str = "SERVICE_PORT";
pub const FACILITIES_PATH_ENV: &str = "THREATMAP_FACILITIES_PATH";
pub const ADVISOR_URL_ENV: &str = "THREATMAP_ADVISOR_URL";
pub const NEWS_URL_ENV: &str = "THREATMAP_NEWS_URL";
pub const AI_URL_ENV: &str = "THREATMAP_AI_URL";

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_path: Option<PathBuf>,
    pub port: u16,
    pub facilities_path: Option<PathBuf>,
    pub advisor_url: Option<String>,
    pub news_url: Option<String>,
    /// Base URL of the extraction/geocoding companion service.
    pub ai_url: Option<String>,
    pub evacuation: EvacuationConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            port: DEFAULT_PORT,
            facilities_path: None,
            advisor_url: None,
            news_url: None,
            ai_url: None,
            evacuation: EvacuationConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let port = env::var(PORT_ENV)
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            data_path: non_empty_var(DATA_PATH_ENV).map(PathBuf::from),
            port,
            facilities_path: non_empty_var(FACILITIES_PATH_ENV).map(PathBuf::from),
            advisor_url: non_empty_var(ADVISOR_URL_ENV),
            news_url: non_empty_var(NEWS_URL_ENV),
            ai_url: non_empty_var(AI_URL_ENV),
            evacuation: EvacuationConfig::from_env(),
        }
    }

    /// Where the threat list lives: the configured path or the platform default.
    pub fn store_path(&self) -> LibResult<PathBuf> {
        match &self.data_path {
            Some(path) => Ok(path.clone()),
            None => default_store_path(),
        }
    }

    /// Ingestion needs both the news feed and the extraction service.
    pub fn ingestion_enabled(&self) -> bool {
        self.news_url.is_some() && self.ai_url.is_some()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_data_path_wins() {
        let config = ServiceConfig {
            data_path: Some(PathBuf::from("/tmp/threats.json")),
            ..ServiceConfig::default()
        };
        assert_eq!(
            config.store_path().unwrap(),
            PathBuf::from("/tmp/threats.json")
        );
    }

    #[test]
    fn ingestion_requires_both_urls() {
        let mut config = ServiceConfig {
            news_url: Some("http://localhost:5000".to_string()),
            ..ServiceConfig::default()
        };
        assert!(!config.ingestion_enabled());

        config.ai_url = Some("http://localhost:5001".to_string());
        assert!(config.ingestion_enabled());
    }
}
