//! HTTP surface for the threatmap engine.
//!
//! This crate is HTTP glue only. Handlers parse and validate the request,
//! call into `threatmap-lib`, and format the response:
//!
//! - [`AppState`]: the shared threat store, evacuation planner and optional
//!   ingestion pipeline
//! - [`health_live`] / [`health_ready`]: probe handlers
//! - [`ProblemDetails`]: RFC 9457 error bodies
//! - [`ServiceResponse`]: wrapper for successful responses
//! - [`metrics`]: Prometheus recorder and business counters
//! - [`logging`]: structured JSON/text logging setup
//! - [`routes`]: the axum [`Router`](axum::Router) with every endpoint mounted

#![deny(warnings)]

pub mod config;
mod health;
pub mod logging;
pub mod metrics;
mod problem;
mod request;
pub mod request_id;
mod response;
pub mod routes;
mod state;

pub use config::ServiceConfig;
pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{init_metrics, metrics_handler, MetricsConfig, MetricsError};
pub use problem::{
    from_lib_error, ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_REQUEST,
    PROBLEM_INVALID_THREAT, PROBLEM_PROTECTED_THREAT, PROBLEM_SERVICE_UNAVAILABLE,
    PROBLEM_THREAT_NOT_FOUND,
};
pub use request::{CreateThreatRequest, EvacuateRequest, ListThreatsQuery, Validate, ZonesQuery};
pub use request_id::{extract_or_generate_request_id, RequestId};
pub use response::ServiceResponse;
pub use routes::router;
pub use state::{AppState, AppStateError};
