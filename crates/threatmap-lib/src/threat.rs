//! Threat records and their expiry/persistence classification.

use chrono::{DateTime, Duration, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::Location;
use crate::hazard;

/// Reserved id of the permanent fixture record that must always exist.
pub const SENTINEL_THREAT_ID: &str = "test-threat-001";

/// Expiry applied to ingested threats when the extractor gives no duration.
pub const DEFAULT_INGEST_DURATION_MINUTES: i64 = 60;

/// Where a threat record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatSource {
    /// Entered by an operator; survives restarts.
    #[default]
    Admin,
    /// Produced by the news ingestion pipeline.
    SimulationNews,
    /// Seeded by the demo scenario endpoint.
    Demo,
    /// Produced by an external simulator.
    Simulator,
}

impl std::fmt::Display for ThreatSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            ThreatSource::Admin => "admin",
            ThreatSource::SimulationNews => "simulation_news",
            ThreatSource::Demo => "demo",
            ThreatSource::Simulator => "simulator",
        };
        f.write_str(value)
    }
}

/// An active (or expired) hazard event.
///
/// `id`, `timestamp` and `source` are optional on input so that callers can
/// submit partial records; [`crate::ThreatStore::add`] fills them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threat {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location_name: String,
    pub location: Location,
    #[serde(default)]
    pub details: String,
    #[serde(alias = "yield", default = "default_yield")]
    pub yield_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hazard_category: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: Option<ThreatSource>,
    #[serde(default)]
    pub persistent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

fn default_yield() -> f64 {
    1.0
}

impl Threat {
    /// Minimal record with the given identity and position; everything else defaulted.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        location: Location,
        yield_kg: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location_name: String::new(),
            location,
            details: String::new(),
            yield_kg,
            incident_type: None,
            hazard_category: None,
            timestamp: None,
            expires_at: None,
            source: None,
            persistent: false,
            raw_text: None,
        }
    }

    /// The permanent fixture record.
    pub fn sentinel(now: DateTime<Utc>) -> Self {
        Self {
            id: SENTINEL_THREAT_ID.to_string(),
            name: "test01".to_string(),
            location_name: "Lingarajapurum, Bengaluru".to_string(),
            location: Location::new(13.013251, 77.624151),
            details: "Permanent liveness fixture".to_string(),
            yield_kg: 7_700.0,
            incident_type: None,
            hazard_category: None,
            timestamp: Some(now),
            expires_at: None,
            source: Some(ThreatSource::Admin),
            persistent: true,
            raw_text: None,
        }
    }

    pub fn with_source(mut self, source: ThreatSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_expiry(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_THREAT_ID
    }

    /// Persistent threats survive demo clears and restart cleanup.
    pub fn is_persistent(&self) -> bool {
        self.is_sentinel() || self.source == Some(ThreatSource::Admin) || self.persistent
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }

    pub fn time_remaining(&self, now: DateTime<Utc>) -> TimeRemaining {
        time_remaining(self.expires_at, now)
    }

    /// Radius of this threat's danger zone (minor band) in meters.
    pub fn danger_radius(&self) -> f64 {
        hazard::danger_radius(self.yield_kg)
    }
}

/// Expiry instant for a duration in minutes, or `None` for "no expiry".
///
/// Durations that leave chrono's representable range are rejected as
/// [`Error::InvalidThreat`].
pub fn calculate_expiry(
    now: DateTime<Utc>,
    duration_minutes: i64,
) -> Result<Option<DateTime<Utc>>> {
    if duration_minutes == 0 {
        return Ok(None);
    }
    TimeDelta::try_minutes(duration_minutes)
        .and_then(|delta| now.checked_add_signed(delta))
        .map(Some)
        .ok_or_else(|| Error::InvalidThreat {
            message: format!("duration of {duration_minutes} minutes is out of range"),
        })
}

/// Remaining lifetime of a threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TimeRemaining {
    Unbounded,
    Expired,
    Remaining { minutes: i64, seconds: i64 },
}

pub fn time_remaining(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> TimeRemaining {
    let Some(expires_at) = expires_at else {
        return TimeRemaining::Unbounded;
    };

    let left = expires_at - now;
    if left <= Duration::zero() {
        return TimeRemaining::Expired;
    }

    let total_seconds = left.num_seconds();
    TimeRemaining::Remaining {
        minutes: total_seconds / 60,
        seconds: total_seconds % 60,
    }
}
