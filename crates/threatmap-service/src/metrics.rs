//! Prometheus metrics for the threatmap service.
//!
//! ```no_run
//! use threatmap_service::metrics::{init_metrics, MetricsConfig};
//!
//! init_metrics(&MetricsConfig::from_env()).expect("failed to initialize metrics");
//! ```
//!
//! The router mounts [`metrics_handler`] at `/metrics`. Without an installed
//! recorder the `record_*` helpers are no-ops.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MetricsConfig {
    /// `METRICS_ENABLED`: anything but "false" enables metrics.
    pub fn from_env() -> Self {
        let enabled = std::env::var("METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        Self { enabled }
    }
}

/// Install the global Prometheus recorder. Call once at startup.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// `GET /metrics` in Prometheus exposition format.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

#[derive(Debug, Clone)]
pub enum MetricsError {
    Disabled,
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => {
                write!(f, "failed to install metrics recorder: {}", e)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

// =============================================================================
// Business Metrics Helpers
// =============================================================================

/// Count a completed evacuation plan by selection tag (`none` when no
/// threat applied).
pub fn record_evacuation_planned(selection_tag: &str) {
    metrics::counter!(
        "threatmap_evacuations_planned_total",
        "selection_tag" => selection_tag.to_string()
    )
    .increment(1);
}

/// Count a store mutation (`add`, `remove`, `seed_demo`, `clear_demo`).
pub fn record_threat_mutation(operation: &str, source: &str) {
    metrics::counter!(
        "threatmap_threat_mutations_total",
        "operation" => operation.to_string(),
        "source" => source.to_string()
    )
    .increment(1);
}

/// Count a rejected or failed request.
///
/// `reason` is one of `validation_error`, `not_found`, `protected`, `store_error`.
pub fn record_request_failed(reason: &str, endpoint: &str) {
    metrics::counter!(
        "threatmap_requests_failed_total",
        "reason" => reason.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

/// Current number of unexpired threats.
pub fn record_active_threats(count: usize) {
    metrics::gauge!("threatmap_active_threats").set(count as f64);
}
