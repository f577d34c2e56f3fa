//! Nearby-cities resolver: a strict, sequential pipeline.
//!
//! fetch candidates → annotate with distance, drop > 15 km → rank (10 closest)
//! → region check (optional, ≤ 15 examined, ≤ 6 kept) → strip distance
//!
//! Without a region the 6 closest ranked cities are returned as-is.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::geocoding::GeocodingClient;
use super::types::{CandidateCity, NearbyError, Ranked, ResolvedCity};
use crate::geo::{distance_km, Coordinate};
use crate::upstream::UpstreamError;
use crate::weather::{LocationQuery, WeatherLookupClient};

/// How many cities to ask the provider for.
pub const CANDIDATE_COUNT: usize = 20;
/// Search radius sent to the provider, and the local hard cutoff.
pub const SEARCH_RADIUS_KM: f64 = 15.0;
const SEARCH_RADIUS_M: u32 = 15_000;
const RANKED_LIMIT: usize = 10;
const MAX_EXAMINED: usize = 15;
/// Upper bound on the size of any result.
pub const MAX_RESULTS: usize = 6;
/// Within this distance a city counts as the same locality whatever its region.
pub const PROXIMITY_FALLBACK_KM: f64 = 5.0;

/// Time limits for one resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolveSettings {
    /// Upper bound for any single upstream call.
    pub call_timeout: Duration,
    /// Upper bound for the whole request, all calls included.
    pub request_deadline: Duration,
}

impl Default for ResolveSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
            request_deadline: Duration::from_secs(30),
        }
    }
}

/// Remaining time for the current request.
struct Budget {
    started: Instant,
    settings: ResolveSettings,
}

impl Budget {
    fn start(settings: ResolveSettings) -> Self {
        Self {
            started: Instant::now(),
            settings,
        }
    }

    /// Timeout for the next call; zero once the deadline has passed.
    fn next_call(&self) -> Duration {
        self.settings
            .request_deadline
            .saturating_sub(self.started.elapsed())
            .min(self.settings.call_timeout)
    }
}

enum RegionVerdict {
    Match,
    Mismatch(String),
    LookupFailed(UpstreamError),
}

/// Resolves the cities closest to a point, optionally restricted to a region.
#[derive(Clone)]
pub struct NearbyCitiesResolver {
    geocoder: Arc<dyn GeocodingClient>,
    weather: Arc<dyn WeatherLookupClient>,
    settings: ResolveSettings,
}

impl NearbyCitiesResolver {
    pub fn new(
        geocoder: Arc<dyn GeocodingClient>,
        weather: Arc<dyn WeatherLookupClient>,
        settings: ResolveSettings,
    ) -> Self {
        Self {
            geocoder,
            weather,
            settings,
        }
    }

    /// Validate `(lat, lon)` and resolve. Nothing touches the network for an
    /// invalid coordinate.
    pub fn resolve(
        &self,
        lat: f64,
        lon: f64,
        region: Option<&str>,
    ) -> Result<Vec<ResolvedCity>, NearbyError> {
        let center = Coordinate::new(lat, lon)?;
        self.resolve_at(center, region)
    }

    pub fn resolve_at(
        &self,
        center: Coordinate,
        region: Option<&str>,
    ) -> Result<Vec<ResolvedCity>, NearbyError> {
        let budget = Budget::start(self.settings);

        let timeout = budget.next_call();
        if timeout.is_zero() {
            return Err(NearbyError::UpstreamFetch(UpstreamError::DeadlineExceeded));
        }
        let candidates = self
            .geocoder
            .find_nearby(center, CANDIDATE_COUNT, SEARCH_RADIUS_M, timeout)
            .map_err(NearbyError::UpstreamFetch)?;

        if candidates.is_empty() {
            debug!(%center, "provider returned no candidates");
            return Ok(Vec::new());
        }

        let fetched = candidates.len();
        let ranked = rank_candidates(center, candidates);

        let selected = match region.map(str::trim).filter(|r| !r.is_empty()) {
            Some(region) => self.filter_by_region(ranked, region, &budget),
            None => ranked.into_iter().take(MAX_RESULTS).collect(),
        };

        info!(
            %center,
            region = region.unwrap_or(""),
            fetched,
            returned = selected.len(),
            "resolved nearby cities"
        );

        Ok(selected.into_iter().map(|r| r.city).collect())
    }

    fn filter_by_region(&self, ranked: Vec<Ranked>, region: &str, budget: &Budget) -> Vec<Ranked> {
        let mut matches = Vec::with_capacity(MAX_RESULTS);
        let mut examined = 0;
        let mut remaining = ranked.into_iter();

        while examined < MAX_EXAMINED && matches.len() < MAX_RESULTS {
            let Some(entry) = remaining.next() else {
                break;
            };
            examined += 1;

            let close = entry.distance_km <= PROXIMITY_FALLBACK_KM;
            let include = match self.check_region(&entry, region, budget) {
                RegionVerdict::Match => {
                    debug!(city = %entry.city.name, distance_km = entry.distance_km, "region match");
                    true
                }
                RegionVerdict::Mismatch(found) => {
                    debug!(
                        city = %entry.city.name,
                        found = %found,
                        distance_km = entry.distance_km,
                        included = close,
                        "region mismatch"
                    );
                    close
                }
                RegionVerdict::LookupFailed(e) => {
                    warn!(
                        city = %entry.city.name,
                        distance_km = entry.distance_km,
                        included = close,
                        error = %e,
                        "region lookup failed"
                    );
                    close
                }
            };

            if include {
                matches.push(entry);
            }
        }

        debug!(examined, kept = matches.len(), "region filter done");
        matches
    }

    fn check_region(&self, entry: &Ranked, region: &str, budget: &Budget) -> RegionVerdict {
        let timeout = budget.next_call();
        if timeout.is_zero() {
            return RegionVerdict::LookupFailed(UpstreamError::DeadlineExceeded);
        }

        let query = LocationQuery::Coordinates(entry.city.coord);
        match self.weather.current_conditions(&query, timeout) {
            Ok(report) if region_matches(region, &report.region) => RegionVerdict::Match,
            Ok(report) => RegionVerdict::Mismatch(report.region),
            Err(e) => RegionVerdict::LookupFailed(e),
        }
    }
}

/// Attach distances, drop anything unusable or beyond the radius, keep the
/// closest few in ascending order.
fn rank_candidates(center: Coordinate, candidates: Vec<CandidateCity>) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = candidates
        .into_iter()
        .filter_map(ResolvedCity::from_candidate)
        .map(|city| Ranked {
            distance_km: distance_km(center, city.coord),
            city,
        })
        .filter(|r| r.distance_km <= SEARCH_RADIUS_KM)
        .collect();

    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked.truncate(RANKED_LIMIT);
    ranked
}

/// Case-insensitive exact match. No alias handling ("CA" ≠ "California").
fn region_matches(wanted: &str, found: &str) -> bool {
    wanted.to_lowercase() == found.trim().to_lowercase()
}
