//! Proximity search against OpenWeatherMap's `find` endpoint.

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::types::CandidateCity;
use crate::geo::Coordinate;
use crate::upstream::{HttpClient, UpstreamError};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Finds cities near a point. Calls block for at most `timeout`.
pub trait GeocodingClient: Send + Sync {
    fn find_nearby(
        &self,
        center: Coordinate,
        count: usize,
        radius_m: u32,
        timeout: Duration,
    ) -> Result<Vec<CandidateCity>, UpstreamError>;
}

pub struct OpenWeatherClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[derive(Deserialize)]
struct FindResponse {
    #[serde(default)]
    list: Option<Vec<Value>>,
}

impl FindResponse {
    /// Entries that do not decode are skipped rather than failing the batch.
    fn into_candidates(self) -> Vec<CandidateCity> {
        self.list
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<CandidateCity>(entry) {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    debug!(error = %e, "skipping malformed candidate");
                    None
                }
            })
            .collect()
    }
}

impl GeocodingClient for OpenWeatherClient {
    fn find_nearby(
        &self,
        center: Coordinate,
        count: usize,
        radius_m: u32,
        timeout: Duration,
    ) -> Result<Vec<CandidateCity>, UpstreamError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingApiKey("OpenWeatherMap"))?;

        let url = format!("{}/data/2.5/find", self.base_url);
        let params = [
            ("lat", center.lat().to_string()),
            ("lon", center.lon().to_string()),
            ("cnt", count.to_string()),
            ("radius", radius_m.to_string()),
            ("units", "imperial".to_string()),
            ("appid", key.to_string()),
        ];

        let body: FindResponse = self.http.get_json(&url, &params, timeout)?;
        Ok(body.into_candidates())
    }
}
