//! Medical facility filtering and selection.
//!
//! Selection runs a fixed four-step hierarchy:
//!
//! 1. strict filter (safety buffer, exclusion keywords, medical marker)
//! 2. advisor ranking over the strict set, falling back to the nearest
//! 3. relaxed filter (safety buffer only), nearest survivor
//! 4. no facility; the caller routes to the safe exit point alone

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::evacuation::{with_timeout, EvacuationConfig};
use crate::geo::Location;

/// Category tag a candidate must carry to pass the strict filter.
pub const MEDICAL_MARKER: &str = "hospital";

/// Category used when querying the search collaborator.
pub const SEARCH_CATEGORY: &str = "hospital";

/// Most candidates ever sent to the advisor.
pub const MAX_ADVISOR_CANDIDATES: usize = 10;

/// Name/category substrings that disqualify a candidate under the strict filter.
pub const EXCLUDED_KEYWORDS: &[&str] = &[
    "dentist",
    "dental",
    "orthodontist",
    "optometry",
    "veterinary",
    "animal",
    "pet",
    "eye",
    "skin",
    "plastic surgery",
    "shop",
    "store",
    "food",
    "restaurant",
    "cafe",
    "bakery",
    "roll",
    "bar",
    "pub",
    "spa",
    "salon",
    "church",
    "temple",
    "mosque",
    "synagogue",
    "chapel",
    "cathedral",
    "religious",
    "worship",
];

/// A place returned by the search collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityCandidate {
    pub name: String,
    #[serde(default, alias = "types")]
    pub categories: Vec<String>,
    pub location: Location,
}

impl FacilityCandidate {
    pub fn new(name: impl Into<String>, categories: &[&str], location: Location) -> Self {
        Self {
            name: name.into(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            location,
        }
    }

    /// True when the candidate lies beyond `danger_radius * buffer` of `center`.
    pub fn is_clear_of(&self, center: &Location, danger_radius: f64, buffer: f64) -> bool {
        self.location.distance_to(center) > danger_radius * buffer
    }

    /// True when the name or any category contains an excluded keyword.
    pub fn is_excluded(&self) -> bool {
        let name = self.name.to_lowercase();
        let categories = self.categories.join(" ").to_lowercase();
        EXCLUDED_KEYWORDS
            .iter()
            .any(|keyword| name.contains(keyword) || categories.contains(keyword))
    }

    pub fn is_medical(&self) -> bool {
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(MEDICAL_MARKER))
    }
}

/// Nearby-place search collaborator.
#[async_trait]
pub trait FacilitySearch: Send + Sync {
    async fn search(&self, center: Location, category: &str) -> Result<Vec<FacilityCandidate>>;
}

/// What the advisor sees of each candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    pub name: String,
    pub types: Vec<String>,
    /// Distance from the safe destination in meters.
    pub distance: f64,
}

/// The advisor's answer. `selected_index` is signed so that bogus negative
/// answers deserialize and are handled as out-of-range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub selected_index: i64,
    #[serde(default)]
    pub reason: String,
}

/// Facility ranking collaborator.
#[async_trait]
pub trait RankingAdvisor: Send + Sync {
    async fn rank(&self, candidates: &[CandidateSummary]) -> Result<Ranking>;
}

/// Advisor that always declines, forcing the deterministic fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdvisor;

#[async_trait]
impl RankingAdvisor for NoAdvisor {
    async fn rank(&self, _candidates: &[CandidateSummary]) -> Result<Ranking> {
        Err(Error::collaborator("advisor", "no ranking advisor configured"))
    }
}

/// How the final destination was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionTag {
    AdvisorSelected,
    AdvisorFallback,
    FilterRelaxed,
    NoHospitalSafeOnly,
}

impl fmt::Display for SelectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            SelectionTag::AdvisorSelected => "advisor-selected",
            SelectionTag::AdvisorFallback => "advisor-fallback",
            SelectionTag::FilterRelaxed => "filter-relaxed",
            SelectionTag::NoHospitalSafeOnly => "no-hospital-safe-only",
        };
        f.write_str(value)
    }
}

/// Result of running the selection hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilitySelection {
    pub tag: SelectionTag,
    pub facility: Option<FacilityCandidate>,
    pub rationale: String,
}

/// Candidates passing safety, exclusion and medical-marker checks.
pub fn strict_filter(
    candidates: &[FacilityCandidate],
    threat_center: &Location,
    danger_radius: f64,
    buffer: f64,
) -> Vec<FacilityCandidate> {
    candidates
        .iter()
        .filter(|c| c.is_clear_of(threat_center, danger_radius, buffer))
        .filter(|c| !c.is_excluded())
        .filter(|c| c.is_medical())
        .cloned()
        .collect()
}

/// Candidates passing the safety check only.
pub fn relaxed_filter(
    candidates: &[FacilityCandidate],
    threat_center: &Location,
    danger_radius: f64,
    buffer: f64,
) -> Vec<FacilityCandidate> {
    candidates
        .iter()
        .filter(|c| c.is_clear_of(threat_center, danger_radius, buffer))
        .cloned()
        .collect()
}

/// Stable sort by distance to `origin`, nearest first.
fn sort_by_distance(candidates: &mut [FacilityCandidate], origin: &Location) {
    candidates.sort_by(|a, b| {
        a.location
            .distance_to(origin)
            .total_cmp(&b.location.distance_to(origin))
    });
}

/// Runs the selection hierarchy against a ranking advisor.
pub struct FacilitySelector<'a> {
    advisor: &'a dyn RankingAdvisor,
    config: &'a EvacuationConfig,
}

impl<'a> FacilitySelector<'a> {
    pub fn new(advisor: &'a dyn RankingAdvisor, config: &'a EvacuationConfig) -> Self {
        Self { advisor, config }
    }

    pub async fn select(
        &self,
        safe_destination: &Location,
        threat_center: &Location,
        danger_radius: f64,
        candidates: &[FacilityCandidate],
    ) -> FacilitySelection {
        let buffer = self.config.facility_buffer;

        let mut strict = strict_filter(candidates, threat_center, danger_radius, buffer);
        debug!(
            candidates = candidates.len(),
            strict = strict.len(),
            "applied strict facility filter"
        );

        if !strict.is_empty() {
            sort_by_distance(&mut strict, safe_destination);
            return self.rank_strict(safe_destination, strict).await;
        }

        let mut relaxed = relaxed_filter(candidates, threat_center, danger_radius, buffer);
        if !relaxed.is_empty() {
            sort_by_distance(&mut relaxed, safe_destination);
            let nearest = relaxed.swap_remove(0);
            info!(name = %nearest.name, "no strict match, using nearest safe facility");
            return FacilitySelection {
                tag: SelectionTag::FilterRelaxed,
                rationale: format!(
                    "no medical facility passed the category filters; '{}' is the nearest facility outside the danger zone",
                    nearest.name
                ),
                facility: Some(nearest),
            };
        }

        info!("no safe facility found, routing to safe exit only");
        FacilitySelection {
            tag: SelectionTag::NoHospitalSafeOnly,
            facility: None,
            rationale: "no facility outside the danger zone was found; routing to the safe exit point"
                .to_string(),
        }
    }

    /// `strict` must be non-empty and sorted nearest first.
    async fn rank_strict(
        &self,
        safe_destination: &Location,
        mut strict: Vec<FacilityCandidate>,
    ) -> FacilitySelection {
        let summaries: Vec<CandidateSummary> = strict
            .iter()
            .take(MAX_ADVISOR_CANDIDATES)
            .map(|c| CandidateSummary {
                name: c.name.clone(),
                types: c.categories.clone(),
                distance: c.location.distance_to(safe_destination),
            })
            .collect();

        let answer = with_timeout(
            "advisor",
            self.config.collaborator_timeout,
            self.advisor.rank(&summaries),
        )
        .await;

        let reason = match answer {
            Ok(ranking) => match usize::try_from(ranking.selected_index) {
                Ok(index) if index < summaries.len() => {
                    let chosen = strict.swap_remove(index);
                    info!(name = %chosen.name, index, "advisor selected facility");
                    let rationale = if ranking.reason.trim().is_empty() {
                        format!("advisor selected '{}'", chosen.name)
                    } else {
                        ranking.reason
                    };
                    return FacilitySelection {
                        tag: SelectionTag::AdvisorSelected,
                        facility: Some(chosen),
                        rationale,
                    };
                }
                _ => {
                    warn!(
                        index = ranking.selected_index,
                        candidates = summaries.len(),
                        "advisor returned out-of-range index"
                    );
                    format!("advisor returned invalid index {}", ranking.selected_index)
                }
            },
            Err(e) => {
                warn!(error = %e, "advisor unavailable");
                format!("advisor unavailable ({e})")
            }
        };

        let nearest = strict.swap_remove(0);
        FacilitySelection {
            tag: SelectionTag::AdvisorFallback,
            rationale: format!("{reason}; using nearest safe facility '{}'", nearest.name),
            facility: Some(nearest),
        }
    }
}
