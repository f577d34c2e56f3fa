//! Core types for nearby-city resolution.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::geo::{Coordinate, InvalidCoordinate, RawCoord};
use crate::upstream::UpstreamError;

/// A city returned by the geocoding provider's proximity search.
///
/// Everything other than `name` and `coord` is kept verbatim in `fields`
/// so it can be passed through to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub coord: Option<RawCoord>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A candidate that survived filtering, with a validated coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCity {
    pub name: String,
    pub coord: Coordinate,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ResolvedCity {
    /// `None` when the provider gave no usable coordinate.
    pub fn from_candidate(candidate: CandidateCity) -> Option<Self> {
        let raw = candidate.coord?;
        let coord = Coordinate::try_from(raw).ok()?;
        Some(Self {
            name: candidate.name,
            coord,
            fields: candidate.fields,
        })
    }
}

/// Working-set entry: a city paired with its distance from the query point.
/// The distance never leaves the resolver.
#[derive(Debug, Clone)]
pub(crate) struct Ranked {
    pub city: ResolvedCity,
    pub distance_km: f64,
}

/// Response shape: `{"list": [...], "count": n}`.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyCities {
    pub list: Vec<ResolvedCity>,
    pub count: usize,
}

impl From<Vec<ResolvedCity>> for NearbyCities {
    fn from(list: Vec<ResolvedCity>) -> Self {
        let count = list.len();
        Self { list, count }
    }
}

/// Errors that stop a nearby-cities request.
#[derive(Debug, Error)]
pub enum NearbyError {
    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinate),
    #[error("Could not fetch nearby cities: {0}")]
    UpstreamFetch(#[source] UpstreamError),
}
