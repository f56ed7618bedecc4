//! Liveness and readiness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use threatmap_lib::SENTINEL_THREAT_ID;

use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// "ok" or "not_ready: <reason>".
    pub status: String,

    pub service: String,

    pub version: String,

    /// Records in the store, including expired ones not yet purged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threats_loaded: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_threats: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingestion_enabled: Option<bool>,
}

impl HealthStatus {
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            threats_loaded: None,
            active_threats: None,
            ingestion_enabled: None,
        }
    }

    pub fn ready(
        service: &str,
        version: &str,
        threats_loaded: usize,
        active_threats: usize,
        ingestion_enabled: bool,
    ) -> Self {
        Self {
            threats_loaded: Some(threats_loaded),
            active_threats: Some(active_threats),
            ingestion_enabled: Some(ingestion_enabled),
            ..Self::alive(service, version)
        }
    }

    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            ..Self::alive(service, version)
        }
    }
}

/// `GET /health/live`: 200 whenever the process is serving.
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// `GET /health/ready`: 200 once the store holds the permanent fixture record.
///
/// ```text
/// GET /health/ready
/// {"status":"ok","service":"threatmap-service","version":"0.1.0","threats_loaded":4,"active_threats":3,"ingestion_enabled":false}
/// ```
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    let store = state.store();
    if !store.exists(SENTINEL_THREAT_ID) {
        let status = HealthStatus::not_ready(service, version, "sentinel threat missing");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response();
    }

    let status = HealthStatus::ready(
        service,
        version,
        store.len(),
        store.list(false).len(),
        state.ingestion().is_some(),
    );
    (StatusCode::OK, Json(status)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alive_omits_store_fields() {
        let json = serde_json::to_string(&HealthStatus::alive("threatmap", "0.1.0")).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(!json.contains("threats_loaded"));
    }

    #[test]
    fn ready_reports_counts() {
        let status = HealthStatus::ready("threatmap", "0.1.0", 4, 3, false);
        assert_eq!(status.status, "ok");
        assert_eq!(status.threats_loaded, Some(4));
        assert_eq!(status.active_threats, Some(3));
        assert_eq!(status.ingestion_enabled, Some(false));
    }

    #[test]
    fn not_ready_carries_reason() {
        let status = HealthStatus::not_ready("threatmap", "0.1.0", "no data");
        assert!(status.status.starts_with("not_ready:"));
        assert!(status.status.contains("no data"));
    }
}
