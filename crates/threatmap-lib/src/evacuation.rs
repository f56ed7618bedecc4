//! End-to-end evacuation planning.

use std::env;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::facility::{
    FacilityCandidate, FacilitySearch, FacilitySelector, RankingAdvisor, SelectionTag,
    SEARCH_CATEGORY,
};
use crate::geo::Location;
use crate::navigation::{self, EvacuationDecision, DEFAULT_COINCIDENCE_TOLERANCE_DEG};
use crate::relevance::{self, ResolvedThreat};
use crate::safe_exit;
use crate::threat::Threat;

/// Environment variable overriding [`EvacuationConfig::collaborator_timeout`].
pub const COLLABORATOR_TIMEOUT_ENV: &str = "THREATMAP_COLLABORATOR_TIMEOUT_MS";

/// Numeric policy used throughout planning.
#[derive(Debug, Clone, PartialEq)]
pub struct EvacuationConfig {
    /// A facility must be farther than `danger_radius * facility_buffer` from the threat.
    pub facility_buffer: f64,
    /// Inside users exit to `danger_radius * exit_margin`.
    pub exit_margin: f64,
    /// Outside users are pushed this many meters further away.
    pub outside_push_meters: f64,
    /// Below this distance the user-to-threat bearing is replaced by north.
    pub heading_floor_meters: f64,
    pub coincidence_tolerance_deg: f64,
    pub collaborator_timeout: Duration,
}

impl Default for EvacuationConfig {
    fn default() -> Self {
        Self {
            facility_buffer: 1.05,
            exit_margin: 1.1,
            outside_push_meters: 2_000.0,
            heading_floor_meters: 5.0,
            coincidence_tolerance_deg: DEFAULT_COINCIDENCE_TOLERANCE_DEG,
            collaborator_timeout: Duration::from_secs(10),
        }
    }
}

impl EvacuationConfig {
    /// Defaults with the collaborator timeout taken from the environment if set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = env::var(COLLABORATOR_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.collaborator_timeout = Duration::from_millis(ms),
                _ => warn!(value = %raw, "ignoring invalid {COLLABORATOR_TIMEOUT_ENV}"),
            }
        }
        config
    }

    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }
}

/// Result of a planning request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvacuationOutcome {
    NoActiveThreat,
    #[serde(rename_all = "camelCase")]
    Route {
        resolved: ResolvedThreat,
        safe_exit: Location,
        decision: EvacuationDecision,
    },
}

impl EvacuationOutcome {
    pub fn decision(&self) -> Option<&EvacuationDecision> {
        match self {
            EvacuationOutcome::NoActiveThreat => None,
            EvacuationOutcome::Route { decision, .. } => Some(decision),
        }
    }
}

/// Orchestrates relevance, safe exit, facility search/selection and composition.
#[derive(Clone)]
pub struct EvacuationPlanner {
    search: Arc<dyn FacilitySearch>,
    advisor: Arc<dyn RankingAdvisor>,
    config: EvacuationConfig,
}

impl EvacuationPlanner {
    pub fn new(
        search: Arc<dyn FacilitySearch>,
        advisor: Arc<dyn RankingAdvisor>,
        config: EvacuationConfig,
    ) -> Self {
        Self {
            search,
            advisor,
            config,
        }
    }

    pub fn config(&self) -> &EvacuationConfig {
        &self.config
    }

    /// Plan an evacuation for `user` against the given active threats.
    pub async fn plan(&self, user: Location, threats: &[Threat]) -> EvacuationOutcome {
        let Some(resolved) = relevance::resolve(&user, threats) else {
            info!(%user, threats = threats.len(), "no active threat to evacuate from");
            return EvacuationOutcome::NoActiveThreat;
        };

        let safe_exit = safe_exit::compute_safe_exit(&user, &resolved, &self.config);
        debug!(%safe_exit, is_inside = resolved.is_inside, "computed safe exit");

        let mut candidates = self.search_near(safe_exit).await;
        if candidates.is_empty() {
            debug!(%user, "no candidates near safe exit, searching around user");
            candidates = self.search_near(user).await;
        }

        let selector = FacilitySelector::new(self.advisor.as_ref(), &self.config);
        let selection = selector
            .select(
                &safe_exit,
                &resolved.center(),
                resolved.danger_radius_meters,
                &candidates,
            )
            .await;

        let destination = match (&selection.tag, &selection.facility) {
            (SelectionTag::NoHospitalSafeOnly, _) | (_, None) => safe_exit,
            (_, Some(facility)) => facility.location,
        };
        let waypoint = resolved.is_inside.then_some(safe_exit);

        let decision = navigation::compose(
            user,
            destination,
            waypoint,
            selection.tag,
            selection.rationale,
            self.config.coincidence_tolerance_deg,
        )
        .with_facility_name(selection.facility.map(|f| f.name));

        info!(
            threat = %resolved.threat.id,
            tag = %decision.selection_tag,
            destination = %decision.destination_location,
            "planned evacuation"
        );

        EvacuationOutcome::Route {
            resolved,
            safe_exit,
            decision,
        }
    }

    async fn search_near(&self, center: Location) -> Vec<FacilityCandidate> {
        let call = self.search.search(center, SEARCH_CATEGORY);
        match with_timeout("facility-search", self.config.collaborator_timeout, call).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, %center, "facility search failed, treating as empty");
                Vec::new()
            }
        }
    }
}

/// Run a collaborator call with a deadline, mapping elapsed to [`Error::CollaboratorTimeout`].
pub async fn with_timeout<T>(
    collaborator: &'static str,
    timeout: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(Error::CollaboratorTimeout {
            collaborator,
            millis: timeout.as_millis(),
        }),
    }
}
