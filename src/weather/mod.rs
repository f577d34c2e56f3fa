//! Weather lookups: current conditions and short-range forecasts.

pub mod types;
pub mod weatherapi;

use std::time::Duration;

use crate::upstream::UpstreamError;

pub use types::{
    validate_forecast_days, ForecastReport, LocationQuery, WeatherReport, MAX_FORECAST_DAYS,
};
pub use weatherapi::WeatherApiClient;

/// A provider of current conditions and forecasts.
///
/// Calls block for at most `timeout`.
pub trait WeatherLookupClient: Send + Sync {
    fn current_conditions(
        &self,
        query: &LocationQuery,
        timeout: Duration,
    ) -> Result<WeatherReport, UpstreamError>;

    fn forecast(
        &self,
        query: &LocationQuery,
        days: u8,
        timeout: Duration,
    ) -> Result<ForecastReport, UpstreamError>;
}
