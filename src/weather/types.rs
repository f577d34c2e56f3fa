//! Weather report types returned to callers.

use crate::geo::Coordinate;
use crate::upstream::lenient_int;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Forecasts are offered for 1 to 4 days ahead.
pub const MAX_FORECAST_DAYS: u8 = 4;

/// What to look weather up for.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Name(String),
    Coordinates(Coordinate),
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{}", name),
            Self::Coordinates(c) => write!(f, "{}", c),
        }
    }
}

/// Current conditions at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub name: String,
    pub region: String,
    pub country: String,
    pub temp_f: f64,
    pub temp_c: f64,
    pub condition: String,
    pub humidity: i64,
    pub wind_mph: f64,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub code: i64,
}

/// Multi-day forecast at a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub day: DayForecast,
    #[serde(default)]
    pub hour: Vec<HourForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub maxtemp_f: f64,
    pub maxtemp_c: f64,
    pub mintemp_f: f64,
    pub mintemp_c: f64,
    pub avgtemp_f: f64,
    pub avgtemp_c: f64,
    pub maxwind_mph: f64,
    pub totalprecip_in: f64,
    pub totalprecip_mm: f64,
    #[serde(deserialize_with = "lenient_int")]
    pub avghumidity: i64,
    pub condition: Condition,
    #[serde(deserialize_with = "lenient_int", default)]
    pub daily_chance_of_rain: i64,
    #[serde(deserialize_with = "lenient_int", default)]
    pub daily_chance_of_snow: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourForecast {
    pub time: String,
    pub temp_f: f64,
    pub temp_c: f64,
    pub condition: Condition,
    pub wind_mph: f64,
    #[serde(deserialize_with = "lenient_int")]
    pub humidity: i64,
    #[serde(deserialize_with = "lenient_int", default)]
    pub chance_of_rain: i64,
    #[serde(deserialize_with = "lenient_int", default)]
    pub chance_of_snow: i64,
}

/// Returns the day count if it is within `1..=MAX_FORECAST_DAYS`.
pub fn validate_forecast_days(days: i64) -> Option<u8> {
    u8::try_from(days)
        .ok()
        .filter(|d| (1..=MAX_FORECAST_DAYS).contains(d))
}
