//! threatmap library entry points.
//!
//! This crate models hazard zones around active threats, owns the persisted
//! threat list and its lifecycle rules, and plans evacuation routes away from
//! the most relevant threat toward a safe medical facility. The CLI and HTTP
//! service should only depend on the items exported here instead of
//! reimplementing behavior.
//!

#![deny(warnings)]

pub mod catalog;
pub mod demo;
pub mod error;
pub mod evacuation;
pub mod facility;
pub mod geo;
pub mod hazard;
pub mod http;
pub mod ingest;
pub mod navigation;
pub mod relevance;
pub mod safe_exit;
pub mod store;
pub mod threat;

pub use catalog::FacilityCatalog;
pub use demo::demo_threats;
pub use error::{Error, Result};
pub use evacuation::{EvacuationConfig, EvacuationOutcome, EvacuationPlanner};
pub use facility::{
    CandidateSummary, FacilityCandidate, FacilitySearch, FacilitySelection, FacilitySelector,
    NoAdvisor, Ranking, RankingAdvisor, SelectionTag,
};
pub use geo::Location;
pub use hazard::{compute_zones, danger_radius, HazardBand, HazardZone};
pub use http::{HttpAdvisor, HttpExtractor, HttpGeocoder, HttpNewsSource};
pub use ingest::{
    ExpiryJanitor, ExtractedThreat, Geocoder, IngestOutcome, IngestionPipeline, IngestionPoller,
    IngestionStatus, NewsItem, NewsSource, ThreatExtractor,
};
pub use navigation::{compose, EvacuationDecision};
pub use relevance::{resolve, ResolvedThreat};
pub use safe_exit::compute_safe_exit;
pub use store::{default_store_path, ClearReport, ReconcileReport, SeedReport, ThreatStore};
pub use threat::{
    calculate_expiry, time_remaining, Threat, ThreatSource, TimeRemaining, SENTINEL_THREAT_ID,
};
