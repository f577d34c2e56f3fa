use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::geo::Coordinate;
use crate::nearby::{NearbyCities, NearbyError};
use crate::saved::{SavedCity, SavedCityView, StoreError};
use crate::weather::{validate_forecast_days, ForecastReport, LocationQuery, WeatherReport};

use super::state::AppState;

const DEFAULT_FORECAST_DAYS: i64 = 3;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

/// Run blocking provider/database work off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        error!(error = %e, "blocking task failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    })
}

fn require_coords(lat: Option<f64>, lon: Option<f64>) -> Result<Coordinate, ApiError> {
    let lat = lat.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing 'lat' parameter"))?;
    let lon = lon.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing 'lon' parameter"))?;
    Coordinate::new(lat, lon).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

fn require_city(city: Option<&str>) -> Result<String, ApiError> {
    match city.map(str::trim) {
        Some(c) if !c.is_empty() => Ok(c.to_string()),
        _ => Err(api_error(StatusCode::BAD_REQUEST, "Missing 'city' parameter")),
    }
}

fn require_days(days: Option<i64>) -> Result<u8, ApiError> {
    validate_forecast_days(days.unwrap_or(DEFAULT_FORECAST_DAYS)).ok_or_else(|| {
        api_error(StatusCode::BAD_REQUEST, "Days parameter must be between 1 and 4")
    })
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

// ─── GET / ───────────────────────────────────────────────────────

pub async fn home() -> &'static str {
    "Weather API is running"
}

// ─── GET /weather, /weather/coords ───────────────────────────────

#[derive(Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
}

#[derive(Deserialize)]
pub struct CoordsQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

pub async fn weather(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CityQuery>,
) -> Result<Json<WeatherReport>, ApiError> {
    let start = Instant::now();
    let city = require_city(params.city.as_deref())?;

    let query = LocationQuery::Name(city.clone());
    let st = state.clone();
    let report = blocking(move || st.weather.current_conditions(&query, st.call_timeout))
        .await?
        .map_err(|e| api_error(StatusCode::NOT_FOUND, format!("{} not found: {}", city, e)))?;

    info!(city = %city, found = %report.name, elapsed_ms = elapsed_ms(start), "GET /weather");
    Ok(Json(report))
}

pub async fn weather_by_coords(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CoordsQuery>,
) -> Result<Json<WeatherReport>, ApiError> {
    let start = Instant::now();
    let coord = require_coords(params.lat, params.lon)?;

    let query = LocationQuery::Coordinates(coord);
    let st = state.clone();
    let report = blocking(move || st.weather.current_conditions(&query, st.call_timeout))
        .await?
        .map_err(|e| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!("Failed to fetch weather for coordinates: {}", e),
            )
        })?;

    info!(%coord, found = %report.name, elapsed_ms = elapsed_ms(start), "GET /weather/coords");
    Ok(Json(report))
}

// ─── GET /weather/nearby ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub region: Option<String>,
}

pub async fn nearby(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearbyQuery>,
) -> Result<Json<NearbyCities>, ApiError> {
    let start = Instant::now();
    let lat = params
        .lat
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing 'lat' parameter"))?;
    let lon = params
        .lon
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing 'lon' parameter"))?;

    let region = params.region.clone();
    let st = state.clone();
    let cities = blocking(move || st.resolver.resolve(lat, lon, region.as_deref()))
        .await?
        .map_err(|e| match e {
            NearbyError::InvalidCoordinate(_) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
            NearbyError::UpstreamFetch(ref cause) => {
                error!(lat, lon, error = %cause, "nearby cities fetch failed");
                api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        })?;

    info!(
        lat,
        lon,
        region = params.region.as_deref().unwrap_or(""),
        count = cities.len(),
        elapsed_ms = elapsed_ms(start),
        "GET /weather/nearby"
    );
    Ok(Json(NearbyCities::from(cities)))
}

// ─── GET /weather/forecast, /weather/forecast/coords ─────────────

#[derive(Deserialize)]
pub struct ForecastQuery {
    pub city: Option<String>,
    pub days: Option<i64>,
}

#[derive(Deserialize)]
pub struct ForecastCoordsQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub days: Option<i64>,
}

pub async fn forecast(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ForecastQuery>,
) -> Result<Json<ForecastReport>, ApiError> {
    let start = Instant::now();
    let city = require_city(params.city.as_deref())?;
    let days = require_days(params.days)?;

    let query = LocationQuery::Name(city.clone());
    let st = state.clone();
    let report = blocking(move || st.weather.forecast(&query, days, st.call_timeout))
        .await?
        .map_err(|e| {
            api_error(
                StatusCode::NOT_FOUND,
                format!("Failed to fetch forecast for {}: {}", city, e),
            )
        })?;

    info!(city = %city, days, elapsed_ms = elapsed_ms(start), "GET /weather/forecast");
    Ok(Json(report))
}

pub async fn forecast_by_coords(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ForecastCoordsQuery>,
) -> Result<Json<ForecastReport>, ApiError> {
    let start = Instant::now();
    let coord = require_coords(params.lat, params.lon)?;
    let days = require_days(params.days)?;

    let query = LocationQuery::Coordinates(coord);
    let st = state.clone();
    let report = blocking(move || st.weather.forecast(&query, days, st.call_timeout))
        .await?
        .map_err(|e| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!("Failed to fetch forecast for coordinates: {}", e),
            )
        })?;

    info!(%coord, days, elapsed_ms = elapsed_ms(start), "GET /weather/forecast/coords");
    Ok(Json(report))
}

// ─── /saved-cities ───────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCityRequest {
    pub city_name: String,
    pub lat: f64,
    pub lon: f64,
}

pub async fn save_city(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SaveCityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SavedCity>), ApiError> {
    let Json(req) = payload.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;

    let st = state.clone();
    let saved = blocking(move || st.saved.save_city(&req.city_name, req.lat, req.lon))
        .await?
        .map_err(|e| {
            warn!(error = %e, "save city rejected");
            api_error(StatusCode::BAD_REQUEST, e.to_string())
        })?;

    info!(id = saved.id, city = %saved.city_name, "POST /saved-cities");
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn list_saved(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SavedCityView>>, ApiError> {
    let start = Instant::now();
    let st = state.clone();
    let views = blocking(move || st.saved.list_with_weather())
        .await?
        .map_err(|e| {
            error!(error = %e, "listing saved cities failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    info!(count = views.len(), elapsed_ms = elapsed_ms(start), "GET /saved-cities");
    Ok(Json(views))
}

pub async fn delete_saved(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let st = state.clone();
    blocking(move || st.saved.delete_city(id))
        .await?
        .map_err(|e| match e {
            StoreError::NotFound(_) => api_error(StatusCode::NOT_FOUND, e.to_string()),
            other => {
                error!(id, error = %other, "delete saved city failed");
                api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        })?;

    info!(id, "DELETE /saved-cities");
    Ok(StatusCode::NO_CONTENT)
}
