//! Request bodies and query strings, with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threatmap_lib::{calculate_expiry, Location, Threat, ThreatSource};

use crate::ProblemDetails;

/// Validation trait for request types.
///
/// Returns a boxed `ProblemDetails` to avoid large `Result::Err` variants.
pub trait Validate {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

fn invalid(detail: impl Into<String>, request_id: &str) -> Box<ProblemDetails> {
    Box::new(ProblemDetails::bad_request(detail, request_id))
}

fn validate_location(location: &Location, request_id: &str) -> Result<(), Box<ProblemDetails>> {
    if location.is_valid() {
        Ok(())
    } else {
        Err(invalid(
            format!(
                "'location' must have lat in [-90, 90] and lng in [-180, 180], got {}",
                location
            ),
            request_id,
        ))
    }
}

/// Body of `POST /api/evacuate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvacuateRequest {
    pub location: Location,
}

impl Validate for EvacuateRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        validate_location(&self.location, request_id)
    }
}

/// Body of `POST /api/threats`.
///
/// `id`, `timestamp` and `source` are filled in by the store when absent.
/// A positive `durationMinutes` sets an expiry; otherwise the threat never
/// expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreatRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub location_name: String,
    pub location: Location,
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
    #[serde(default)]
    pub source: Option<ThreatSource>,
    #[serde(default)]
    pub persistent: bool,
}

impl Validate for CreateThreatRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if self.name.trim().is_empty() {
            return Err(invalid(
                "The 'name' field is required and cannot be empty",
                request_id,
            ));
        }

        validate_location(&self.location, request_id)?;

        if let Some(yield_kg) = self.yield_kg {
            if !yield_kg.is_finite() || yield_kg < 0.0 {
                return Err(invalid(
                    format!("'yieldKg' must be a finite number >= 0, got {}", yield_kg),
                    request_id,
                ));
            }
        }

        if let Some(minutes) = self.duration_minutes {
            if minutes < 0 {
                return Err(invalid(
                    format!("'durationMinutes' must be >= 0, got {}", minutes),
                    request_id,
                ));
            }
        }

        Ok(())
    }
}

impl CreateThreatRequest {
    /// Build the record to store. Fails when the expiry would leave the
    /// representable date range.
    pub fn into_threat(self, now: DateTime<Utc>) -> threatmap_lib::Result<Threat> {
        let expires_at = match self.duration_minutes.filter(|m| *m > 0) {
            Some(minutes) => calculate_expiry(now, minutes)?,
            None => None,
        };

        let mut threat = Threat::new(
            self.id.unwrap_or_default(),
            self.name,
            self.location,
            self.yield_kg.unwrap_or(1.0),
        )
        .with_expiry(expires_at);
        threat.location_name = self.location_name;
        threat.details = self.details;
        threat.incident_type = self.incident_type;
        threat.hazard_category = self.hazard_category;
        threat.source = self.source;
        threat.persistent = self.persistent;
        Ok(threat)
    }
}

/// Query of `GET /api/threats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListThreatsQuery {
    #[serde(default, rename = "includeExpired")]
    pub include_expired: bool,
}

/// Query of `GET /api/zones`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZonesQuery {
    #[serde(default, rename = "yieldKg", alias = "yield")]
    pub yield_kg: Option<f64>,
}

impl Validate for ZonesQuery {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        match self.yield_kg {
            None => Err(invalid("The 'yieldKg' query parameter is required", request_id)),
            Some(y) if !y.is_finite() || y < 0.0 => Err(invalid(
                format!("'yieldKg' must be a finite number >= 0, got {}", y),
                request_id,
            )),
            Some(_) => Ok(()),
        }
    }
}
