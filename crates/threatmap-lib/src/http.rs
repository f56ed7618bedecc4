//! reqwest-backed adapters for the AI companion service and the news feed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::facility::{CandidateSummary, Ranking, RankingAdvisor};
use crate::geo::Location;
use crate::ingest::{ExtractedThreat, Geocoder, NewsItem, NewsSource, ThreatExtractor};

const EVALUATE_FACILITIES_PATH: &str = "/api/evaluate-facilities";
const EXTRACT_THREAT_PATH: &str = "/api/extract-threat-info";
const GEOCODE_PATH: &str = "/api/geocode";
const NEWS_PATH: &str = "/api/fake-news-threat";

/// Small JSON client bound to one base URL.
#[derive(Debug, Clone)]
struct JsonClient {
    http: Client,
    base_url: String,
    name: &'static str,
}

impl JsonClient {
    fn new(name: &'static str, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            name,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(collaborator = self.name, %url, "GET");
        let response = self.http.get(&url).send().await?;
        self.decode(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(collaborator = self.name, %url, "POST");
        let response = self.http.post(&url).json(body).send().await?;
        self.decode(response).await
    }

    async fn decode<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::collaborator(
                self.name,
                format!("unexpected status {status}"),
            ));
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::collaborator(self.name, format!("malformed response: {e}")))
    }
}

/// Facility ranking via `POST /api/evaluate-facilities`.
#[derive(Debug, Clone)]
pub struct HttpAdvisor {
    client: JsonClient,
}

impl HttpAdvisor {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: JsonClient::new("advisor", base_url, timeout)?,
        })
    }
}

#[async_trait]
impl RankingAdvisor for HttpAdvisor {
    async fn rank(&self, candidates: &[CandidateSummary]) -> Result<Ranking> {
        self.client
            .post(EVALUATE_FACILITIES_PATH, &json!({ "facilities": candidates }))
            .await
    }
}

/// News feed via `GET /api/fake-news-threat`.
#[derive(Debug, Clone)]
pub struct HttpNewsSource {
    client: JsonClient,
}

impl HttpNewsSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: JsonClient::new("news", base_url, timeout)?,
        })
    }
}

#[async_trait]
impl NewsSource for HttpNewsSource {
    async fn fetch(&self) -> Result<NewsItem> {
        self.client.get(NEWS_PATH).await
    }
}

/// Text extraction via `POST /api/extract-threat-info`.
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    client: JsonClient,
}

impl HttpExtractor {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: JsonClient::new("extractor", base_url, timeout)?,
        })
    }
}

#[async_trait]
impl ThreatExtractor for HttpExtractor {
    async fn extract(&self, text: &str) -> Result<ExtractedThreat> {
        self.client
            .post(EXTRACT_THREAT_PATH, &json!({ "text": text }))
            .await
    }
}

/// Geocoding via `POST /api/geocode`.
#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    client: JsonClient,
}

impl HttpGeocoder {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: JsonClient::new("geocoder", base_url, timeout)?,
        })
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, location_name: &str) -> Result<Location> {
        self.client
            .post(GEOCODE_PATH, &json!({ "locationName": location_name }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = JsonClient::new("advisor", "http://localhost:5000/", Duration::from_secs(1))
            .unwrap();
        assert_eq!(
            client.url(EVALUATE_FACILITIES_PATH),
            "http://localhost:5000/api/evaluate-facilities"
        );
    }

    #[test]
    fn advisor_payload_matches_wire_shape() {
        let summaries = vec![CandidateSummary {
            name: "General".to_string(),
            types: vec!["hospital".to_string()],
            distance: 120.5,
        }];
        let body = json!({ "facilities": summaries });
        assert_eq!(body["facilities"][0]["types"][0], "hospital");
        assert_eq!(body["facilities"][0]["distance"], 120.5);
    }

    #[test]
    fn ranking_parses_snake_case_index() {
        let ranking: Ranking =
            serde_json::from_str(r#"{"selected_index": 2, "reason": "closest ER"}"#).unwrap();
        assert_eq!(ranking.selected_index, 2);
    }
}
