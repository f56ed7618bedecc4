//! News-driven threat ingestion.
//!
//! A [`NewsSource`] yields raw text items. Each new item is run through a
//! [`ThreatExtractor`] and a [`Geocoder`], validated, given an expiry and
//! inserted into the [`ThreatStore`]. Collaborator failures never escape the
//! pipeline: they are logged and the item is reported as rejected.

mod scheduler;

pub use scheduler::{
    ExpiryJanitor, IngestionPoller, DEFAULT_JANITOR_INTERVAL_SECS, DEFAULT_POLL_INTERVAL_SECS,
};

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::evacuation::with_timeout;
use crate::geo::Location;
use crate::store::ThreatStore;
use crate::threat::{calculate_expiry, Threat, ThreatSource, DEFAULT_INGEST_DURATION_MINUTES};

/// Raw news item from the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_type: Option<String>,
}

/// Structured fields pulled out of a news text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedThreat {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location_name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default, alias = "yield")]
    pub yield_kg: Option<f64>,
    #[serde(default)]
    pub incident_type: Option<String>,
    #[serde(default)]
    pub hazard_category: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
}

impl ExtractedThreat {
    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("locationName", &self.location_name),
            ("details", &self.details),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch(&self) -> Result<NewsItem>;
}

#[async_trait]
pub trait ThreatExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<ExtractedThreat>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, location_name: &str) -> Result<Location>;
}

/// What happened to one news item.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Ingested(Box<Threat>),
    Duplicate,
    Rejected(String),
}

/// Last successful ingestion, for status displays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionStatus {
    pub last_article_title: Option<String>,
    pub last_processed_at: Option<DateTime<Utc>>,
}

pub struct IngestionPipeline {
    store: Arc<ThreatStore>,
    extractor: Arc<dyn ThreatExtractor>,
    geocoder: Arc<dyn Geocoder>,
    timeout: Duration,
    status: Mutex<IngestionStatus>,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<ThreatStore>,
        extractor: Arc<dyn ThreatExtractor>,
        geocoder: Arc<dyn Geocoder>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            extractor,
            geocoder,
            timeout,
            status: Mutex::new(IngestionStatus::default()),
        }
    }

    pub fn status(&self) -> IngestionStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn process(&self, item: &NewsItem) -> IngestOutcome {
        self.process_at(item, Utc::now()).await
    }

    pub async fn process_at(&self, item: &NewsItem, now: DateTime<Utc>) -> IngestOutcome {
        if self.store.exists(&item.id) {
            debug!(id = %item.id, "news item already ingested");
            return IngestOutcome::Duplicate;
        }

        let preview: String = item.text.chars().take(50).collect();
        debug!(id = %item.id, text = %preview, "processing news item");

        let extracted =
            match with_timeout("extractor", self.timeout, self.extractor.extract(&item.text)).await
            {
                Ok(extracted) => extracted,
                Err(e) => return reject(&item.id, format!("extraction failed: {e}")),
            };

        let missing = extracted.missing_fields();
        if !missing.is_empty() {
            return reject(
                &item.id,
                format!("extracted data missing fields: {}", missing.join(", ")),
            );
        }

        let location = match with_timeout(
            "geocoder",
            self.timeout,
            self.geocoder.geocode(&extracted.location_name),
        )
        .await
        {
            Ok(location) => location,
            Err(e) => return reject(&item.id, format!("geocoding failed: {e}")),
        };

        if !location.is_valid() {
            return reject(&item.id, format!("coordinates out of range: {location}"));
        }

        let duration = extracted
            .duration_minutes
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_INGEST_DURATION_MINUTES);
        let expires_at = match calculate_expiry(now, duration) {
            Ok(expires_at) => expires_at,
            Err(e) => return reject(&item.id, e.to_string()),
        };

        let mut threat = Threat::new(
            item.id.clone(),
            extracted.name,
            location,
            extracted.yield_kg.unwrap_or(1.0),
        )
        .with_source(ThreatSource::SimulationNews)
        .with_expiry(expires_at);
        threat.location_name = extracted.location_name;
        threat.details = extracted.details;
        threat.incident_type = extracted.incident_type;
        threat.hazard_category = extracted.hazard_category;
        threat.timestamp = Some(now);
        threat.raw_text = Some(item.text.clone());

        let stored = match self.store.add_at(threat, now) {
            Ok(stored) => stored,
            Err(e) => return reject(&item.id, format!("store rejected threat: {e}")),
        };

        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = IngestionStatus {
            last_article_title: Some(stored.name.clone()),
            last_processed_at: Some(now),
        };

        info!(id = %stored.id, name = %stored.name, duration_minutes = duration, "ingested threat");
        IngestOutcome::Ingested(Box::new(stored))
    }
}

fn reject(id: &str, reason: String) -> IngestOutcome {
    warn!(id, %reason, "rejected news item");
    IngestOutcome::Rejected(reason)
}
