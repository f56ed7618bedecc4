//! Offline facility search backed by a fixed list of places.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::facility::{FacilityCandidate, FacilitySearch};
use crate::geo::Location;

/// Radius searched around the query center, in meters.
pub const DEFAULT_SEARCH_RADIUS_METERS: f64 = 5_000.0;

/// In-memory [`FacilitySearch`] returning catalog entries near the query
/// center, nearest first.
#[derive(Debug, Clone)]
pub struct FacilityCatalog {
    facilities: Vec<FacilityCandidate>,
    search_radius_meters: f64,
}

impl FacilityCatalog {
    pub fn new(facilities: Vec<FacilityCandidate>) -> Self {
        Self {
            facilities,
            search_radius_meters: DEFAULT_SEARCH_RADIUS_METERS,
        }
    }

    /// Load a JSON array of facilities (`name`, `types`/`categories`, `location`).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let facilities: Vec<FacilityCandidate> = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), count = facilities.len(), "loaded facility catalog");
        Ok(Self::new(facilities))
    }

    pub fn with_search_radius(mut self, meters: f64) -> Self {
        self.search_radius_meters = meters;
        self
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    /// Entries within the search radius of `center` carrying `category`
    /// (case-insensitive; an empty category matches everything).
    pub fn nearby(&self, center: &Location, category: &str) -> Vec<FacilityCandidate> {
        let mut hits: Vec<(f64, &FacilityCandidate)> = self
            .facilities
            .iter()
            .filter(|f| {
                category.is_empty() || f.categories.iter().any(|c| c.eq_ignore_ascii_case(category))
            })
            .map(|f| (f.location.distance_to(center), f))
            .filter(|(distance, _)| *distance <= self.search_radius_meters)
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, f)| f.clone()).collect()
    }
}

#[async_trait]
impl FacilitySearch for FacilityCatalog {
    async fn search(&self, center: Location, category: &str) -> Result<Vec<FacilityCandidate>> {
        Ok(self.nearby(&center, category))
    }
}
