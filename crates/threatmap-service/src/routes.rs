//! Endpoint handlers and the router that mounts them.
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | GET | `/api/threats` | active threats (`?includeExpired=true` for all) |
//! | POST | `/api/threats` | add a threat |
//! | DELETE | `/api/threats/{id}` | remove a threat |
//! | POST | `/api/demo/seed` | insert the demo scenario |
//! | POST | `/api/demo/clear` | drop every ephemeral threat |
//! | POST | `/api/evacuate` | plan an evacuation from `{location}` |
//! | GET | `/api/zones` | hazard bands for `?yieldKg=` |
//! | GET | `/api/ingestion/status` | last ingested news item |
//! | GET | `/metrics` | Prometheus scrape |
//! | GET | `/health/live`, `/health/ready` | probes |

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use threatmap_lib::{
    compute_zones, danger_radius, demo_threats, ClearReport, EvacuationOutcome, HazardZone,
    IngestionStatus, SeedReport, Threat, SENTINEL_THREAT_ID,
};

use crate::metrics::{
    metrics_handler, record_active_threats, record_evacuation_planned, record_request_failed,
    record_threat_mutation,
};
use crate::{
    extract_or_generate_request_id, from_lib_error, health_live, health_ready, AppState,
    CreateThreatRequest, EvacuateRequest, ListThreatsQuery, ProblemDetails, ServiceResponse,
    Validate, ZonesQuery,
};

type HandlerResult<T> = Result<T, ProblemDetails>;

/// Build the service router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/threats", get(list_threats).post(create_threat))
        .route("/api/threats/{id}", delete(delete_threat))
        .route("/api/demo/seed", post(seed_demo))
        .route("/api/demo/clear", post(clear_demo))
        .route("/api/evacuate", post(evacuate))
        .route("/api/zones", get(zones))
        .route("/api/ingestion/status", get(ingestion_status))
        .route("/metrics", get(metrics_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ThreatList {
    threats: Vec<Threat>,
    count: usize,
}

#[derive(Debug, Serialize)]
struct Deleted {
    deleted: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvacuationResponse {
    #[serde(flatten)]
    outcome: EvacuationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    navigation_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ZonesResponse {
    yield_kg: f64,
    danger_radius_meters: f64,
    zones: [HazardZone; 4],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestionStatusResponse {
    enabled: bool,
    #[serde(flatten)]
    status: IngestionStatus,
}

async fn list_threats(
    State(state): State<AppState>,
    Query(query): Query<ListThreatsQuery>,
) -> ServiceResponse<ThreatList> {
    let threats = state.store().list(query.include_expired);
    if !query.include_expired {
        record_active_threats(threats.len());
    }
    let count = threats.len();
    ServiceResponse::new(ThreatList { threats, count })
}

async fn create_threat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateThreatRequest>,
) -> HandlerResult<(StatusCode, ServiceResponse<Threat>)> {
    let request_id = extract_or_generate_request_id(&headers);

    if let Err(problem) = request.validate(request_id.as_str()) {
        record_request_failed("validation_error", "create_threat");
        return Err(*problem);
    }

    let added = request
        .into_threat(Utc::now())
        .and_then(|threat| state.store().add(threat));
    match added {
        Ok(threat) => {
            let source = threat.source.unwrap_or_default().to_string();
            record_threat_mutation("add", &source);
            info!(request_id = %request_id, id = %threat.id, source = %source, "threat created");
            Ok((StatusCode::CREATED, ServiceResponse::new(threat)))
        }
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "threat rejected");
            record_request_failed("store_error", "create_threat");
            Err(from_lib_error(&e, request_id.as_str()))
        }
    }
}

async fn delete_threat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> HandlerResult<ServiceResponse<Deleted>> {
    let request_id = extract_or_generate_request_id(&headers);

    if id == SENTINEL_THREAT_ID {
        record_request_failed("protected", "delete_threat");
        return Err(ProblemDetails::protected_threat(&id, request_id.as_str()));
    }

    match state.store().remove(&id) {
        Ok(true) => {
            record_threat_mutation("remove", "any");
            Ok(ServiceResponse::new(Deleted { deleted: id }))
        }
        Ok(false) => {
            record_request_failed("not_found", "delete_threat");
            Err(ProblemDetails::threat_not_found(&id, request_id.as_str()))
        }
        Err(e) => {
            error!(request_id = %request_id, id = %id, error = %e, "delete failed");
            record_request_failed("store_error", "delete_threat");
            Err(from_lib_error(&e, request_id.as_str()))
        }
    }
}

async fn seed_demo(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HandlerResult<ServiceResponse<SeedReport>> {
    let request_id = extract_or_generate_request_id(&headers);

    state
        .store()
        .seed_demo(demo_threats(Utc::now()))
        .map(|report| {
            record_threat_mutation("seed_demo", "demo");
            info!(
                request_id = %request_id,
                added = report.added,
                total = report.total,
                "demo seeded"
            );
            ServiceResponse::new(report)
        })
        .map_err(|e| {
            error!(request_id = %request_id, error = %e, "demo seed failed");
            record_request_failed("store_error", "seed_demo");
            from_lib_error(&e, request_id.as_str())
        })
}

async fn clear_demo(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HandlerResult<ServiceResponse<ClearReport>> {
    let request_id = extract_or_generate_request_id(&headers);

    state
        .store()
        .clear_ephemeral()
        .map(|report| {
            record_threat_mutation("clear_demo", "ephemeral");
            info!(
                request_id = %request_id,
                removed = report.removed,
                remaining = report.remaining,
                "ephemeral threats cleared"
            );
            ServiceResponse::new(report)
        })
        .map_err(|e| {
            error!(request_id = %request_id, error = %e, "clear failed");
            record_request_failed("store_error", "clear_demo");
            from_lib_error(&e, request_id.as_str())
        })
}

async fn evacuate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<EvacuateRequest>,
) -> HandlerResult<ServiceResponse<EvacuationResponse>> {
    let request_id = extract_or_generate_request_id(&headers);

    if let Err(problem) = request.validate(request_id.as_str()) {
        record_request_failed("validation_error", "evacuate");
        return Err(*problem);
    }

    let threats = state.store().list(false);
    info!(
        request_id = %request_id,
        location = %request.location,
        active_threats = threats.len(),
        "planning evacuation"
    );

    let outcome = state.planner().plan(request.location, &threats).await;
    let navigation_url = outcome.decision().map(|d| d.navigation_url());

    let tag = outcome
        .decision()
        .map(|d| d.selection_tag.to_string())
        .unwrap_or_else(|| "none".to_string());
    record_evacuation_planned(&tag);
    info!(request_id = %request_id, selection_tag = %tag, "evacuation planned");

    Ok(ServiceResponse::new(EvacuationResponse {
        outcome,
        navigation_url,
    }))
}

async fn zones(
    headers: HeaderMap,
    Query(query): Query<ZonesQuery>,
) -> HandlerResult<ServiceResponse<ZonesResponse>> {
    let request_id = extract_or_generate_request_id(&headers);

    if let Err(problem) = query.validate(request_id.as_str()) {
        record_request_failed("validation_error", "zones");
        return Err(*problem);
    }
    let yield_kg = query.yield_kg.unwrap_or_default();

    Ok(ServiceResponse::new(ZonesResponse {
        yield_kg,
        danger_radius_meters: danger_radius(yield_kg),
        zones: compute_zones(yield_kg),
    }))
}

async fn ingestion_status(
    State(state): State<AppState>,
) -> ServiceResponse<IngestionStatusResponse> {
    let response = match state.ingestion() {
        Some(pipeline) => IngestionStatusResponse {
            enabled: true,
            status: pipeline.status(),
        },
        None => IngestionStatusResponse {
            enabled: false,
            status: IngestionStatus::default(),
        },
    };
    ServiceResponse::new(response)
}
