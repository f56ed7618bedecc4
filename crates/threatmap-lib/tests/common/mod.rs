#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use threatmap_lib::ingest::{ExtractedThreat, Geocoder, NewsItem, NewsSource, ThreatExtractor};
use threatmap_lib::{
    CandidateSummary, Error, FacilityCandidate, FacilitySearch, Location, Ranking, RankingAdvisor,
    Result,
};

/// Threat at the origin whose danger radius is 2 km.
pub const BIG_YIELD_KG: f64 = 1_000.0;

/// Pool around a 2 km threat at (0, 0):
/// "Inside Hospital" sits within the buffered radius, the other two are safe.
pub fn scenario_pool() -> Vec<FacilityCandidate> {
    vec![
        FacilityCandidate::new("Inside Hospital", &["hospital"], Location::new(0.0, 0.01)),
        FacilityCandidate::new("East General", &["hospital", "health"], Location::new(0.0, 0.03)),
        FacilityCandidate::new("North Medical", &["hospital"], Location::new(0.025, 0.0)),
    ]
}

/// Returns queued responses in call order, then empty lists; records each center.
#[derive(Default)]
pub struct ScriptedSearch {
    responses: Mutex<VecDeque<Result<Vec<FacilityCandidate>>>>,
    pub centers: Mutex<Vec<Location>>,
}

impl ScriptedSearch {
    pub fn new(responses: Vec<Result<Vec<FacilityCandidate>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            centers: Mutex::new(Vec::new()),
        }
    }

    pub fn always(pool: Vec<FacilityCandidate>) -> Self {
        Self::new(vec![Ok(pool.clone()), Ok(pool)])
    }

    pub fn calls(&self) -> Vec<Location> {
        self.centers.lock().unwrap().clone()
    }
}

#[async_trait]
impl FacilitySearch for ScriptedSearch {
    async fn search(&self, center: Location, _category: &str) -> Result<Vec<FacilityCandidate>> {
        self.centers.lock().unwrap().push(center);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Always answers with the same index and remembers what it was shown.
pub struct FixedAdvisor {
    pub index: i64,
    pub seen: Mutex<Vec<CandidateSummary>>,
}

impl FixedAdvisor {
    pub fn new(index: i64) -> Self {
        Self {
            index,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen_names(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|c| c.name.clone()).collect()
    }
}

#[async_trait]
impl RankingAdvisor for FixedAdvisor {
    async fn rank(&self, candidates: &[CandidateSummary]) -> Result<Ranking> {
        *self.seen.lock().unwrap() = candidates.to_vec();
        Ok(Ranking {
            selected_index: self.index,
            reason: format!("picked #{}", self.index),
        })
    }
}

pub struct FailingAdvisor;

#[async_trait]
impl RankingAdvisor for FailingAdvisor {
    async fn rank(&self, _candidates: &[CandidateSummary]) -> Result<Ranking> {
        Err(Error::collaborator("advisor", "service returned 500"))
    }
}

/// Never answers within any reasonable deadline.
pub struct StalledAdvisor;

#[async_trait]
impl RankingAdvisor for StalledAdvisor {
    async fn rank(&self, _candidates: &[CandidateSummary]) -> Result<Ranking> {
        tokio::time::sleep(Duration::from_secs(3_600)).await;
        Ok(Ranking {
            selected_index: 0,
            reason: "too late".to_string(),
        })
    }
}

pub struct FixedNews(pub NewsItem);

#[async_trait]
impl NewsSource for FixedNews {
    async fn fetch(&self) -> Result<NewsItem> {
        Ok(self.0.clone())
    }
}

pub struct FixedExtractor(pub ExtractedThreat);

#[async_trait]
impl ThreatExtractor for FixedExtractor {
    async fn extract(&self, _text: &str) -> Result<ExtractedThreat> {
        Ok(self.0.clone())
    }
}

pub struct FailingExtractor;

#[async_trait]
impl ThreatExtractor for FailingExtractor {
    async fn extract(&self, _text: &str) -> Result<ExtractedThreat> {
        Err(Error::collaborator("extractor", "connection refused"))
    }
}

pub struct FixedGeocoder(pub Location);

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, _location_name: &str) -> Result<Location> {
        Ok(self.0)
    }
}

pub fn news_item(id: &str) -> NewsItem {
    NewsItem {
        id: id.to_string(),
        text: "Fire reported at a warehouse near Indiranagar, thick smoke spreading".to_string(),
        timestamp: None,
        source_type: Some("twitter".to_string()),
    }
}

pub fn extracted_fire() -> ExtractedThreat {
    ExtractedThreat {
        name: "Warehouse Fire".to_string(),
        location_name: "Indiranagar, Bengaluru".to_string(),
        details: "Thick smoke spreading".to_string(),
        yield_kg: None,
        incident_type: Some("fire".to_string()),
        hazard_category: Some("thermal".to_string()),
        duration_minutes: Some(90),
    }
}
