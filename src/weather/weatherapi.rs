//! WeatherAPI.com provider (current conditions and forecasts).

use serde::Deserialize;
use std::time::Duration;

use super::types::{Condition, ForecastDay, ForecastReport, LocationQuery, WeatherReport};
use super::WeatherLookupClient;
use crate::upstream::{lenient_int, HttpClient, UpstreamError};

pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com";

pub struct WeatherApiClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherApiClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    fn key(&self) -> Result<&str, UpstreamError> {
        self.api_key
            .as_deref()
            .ok_or(UpstreamError::MissingApiKey("WeatherAPI"))
    }
}

impl WeatherLookupClient for WeatherApiClient {
    fn current_conditions(
        &self,
        query: &LocationQuery,
        timeout: Duration,
    ) -> Result<WeatherReport, UpstreamError> {
        let url = format!("{}/v1/current.json", self.base_url);
        let params = [("key", self.key()?.to_string()), ("q", query.to_string())];
        let body: CurrentResponse = self.http.get_json(&url, &params, timeout)?;
        Ok(body.into_report())
    }

    fn forecast(
        &self,
        query: &LocationQuery,
        days: u8,
        timeout: Duration,
    ) -> Result<ForecastReport, UpstreamError> {
        let url = format!("{}/v1/forecast.json", self.base_url);
        let params = [
            ("key", self.key()?.to_string()),
            ("q", query.to_string()),
            ("days", days.to_string()),
        ];
        let body: ForecastResponse = self.http.get_json(&url, &params, timeout)?;
        Ok(body.into_report())
    }
}

// ─── Wire format ────────────────────────────────────────────────

#[derive(Deserialize)]
struct ApiLocation {
    name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct ApiCurrent {
    temp_f: f64,
    temp_c: f64,
    condition: Condition,
    #[serde(deserialize_with = "lenient_int")]
    humidity: i64,
    wind_mph: f64,
}

#[derive(Deserialize)]
struct CurrentResponse {
    location: ApiLocation,
    current: ApiCurrent,
}

impl CurrentResponse {
    fn into_report(self) -> WeatherReport {
        WeatherReport {
            name: self.location.name,
            region: self.location.region,
            country: self.location.country,
            temp_f: self.current.temp_f,
            temp_c: self.current.temp_c,
            condition: self.current.condition.text,
            humidity: self.current.humidity,
            wind_mph: self.current.wind_mph,
            lat: self.location.lat,
            lon: self.location.lon,
        }
    }
}

#[derive(Deserialize)]
struct ApiForecast {
    #[serde(default)]
    forecastday: Vec<ForecastDay>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    location: ApiLocation,
    forecast: ApiForecast,
}

impl ForecastResponse {
    fn into_report(self) -> ForecastReport {
        ForecastReport {
            name: self.location.name,
            region: self.location.region,
            country: self.location.country,
            lat: self.location.lat,
            lon: self.location.lon,
            forecast: self.forecast.forecastday,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT_LONDON: &str = r#"{
        "location": {
            "name": "London", "region": "City of London, Greater London",
            "country": "United Kingdom", "lat": 51.52, "lon": -0.11,
            "tz_id": "Europe/London", "localtime": "2026-10-16 09:00"
        },
        "current": {
            "temp_c": 20.0, "temp_f": 68.0, "is_day": 1,
            "condition": {"text": "Sunny", "icon": "//cdn.weatherapi.com/113.png", "code": 1000},
            "wind_mph": 10.5, "humidity": 65, "cloud": 0
        }
    }"#;

    const FORECAST_TWO_DAYS: &str = r#"{
        "location": {"name": "Austin", "region": "Texas", "country": "USA", "lat": 30.27, "lon": -97.74},
        "current": {"temp_c": 25.0, "temp_f": 77.0, "condition": {"text": "Clear"}, "wind_mph": 3.0, "humidity": 40},
        "forecast": {"forecastday": [
            {"date": "2026-10-16", "day": {
                "maxtemp_c": 30.1, "maxtemp_f": 86.2, "mintemp_c": 18.0, "mintemp_f": 64.4,
                "avgtemp_c": 24.0, "avgtemp_f": 75.2, "maxwind_mph": 9.4,
                "totalprecip_mm": 0.0, "totalprecip_in": 0.0, "avghumidity": 58.0,
                "daily_chance_of_rain": 0, "daily_chance_of_snow": 0,
                "condition": {"text": "Sunny", "icon": "//cdn/113.png", "code": 1000}},
             "hour": [{"time": "2026-10-16 00:00", "temp_c": 20.0, "temp_f": 68.0,
                "condition": {"text": "Clear", "icon": "//cdn/113.png", "code": 1000},
                "wind_mph": 4.0, "humidity": 70, "chance_of_rain": 0, "chance_of_snow": 0}]},
            {"date": "2026-10-17", "day": {
                "maxtemp_c": 27.0, "maxtemp_f": 80.6, "mintemp_c": 17.0, "mintemp_f": 62.6,
                "avgtemp_c": 22.0, "avgtemp_f": 71.6, "maxwind_mph": 12.1,
                "totalprecip_mm": 4.2, "totalprecip_in": 0.17, "avghumidity": 71,
                "daily_chance_of_rain": 80, "daily_chance_of_snow": 0,
                "condition": {"text": "Patchy rain nearby", "icon": "//cdn/176.png", "code": 1063}},
             "hour": []}
        ]}
    }"#;

    #[test]
    fn test_current_response_to_report() {
        let body: CurrentResponse = serde_json::from_str(CURRENT_LONDON).unwrap();
        let report = body.into_report();
        assert_eq!(report.name, "London");
        assert_eq!(report.region, "City of London, Greater London");
        assert_eq!(report.country, "United Kingdom");
        assert_eq!(report.temp_f, 68.0);
        assert_eq!(report.temp_c, 20.0);
        assert_eq!(report.condition, "Sunny");
        assert_eq!(report.humidity, 65);
        assert_eq!(report.wind_mph, 10.5);
        assert_eq!(report.lat, 51.52);
        assert_eq!(report.lon, -0.11);
    }

    #[test]
    fn test_current_response_missing_current_is_error() {
        let body = r#"{"location": {"name": "X", "lat": 0, "lon": 0}}"#;
        assert!(serde_json::from_str::<CurrentResponse>(body).is_err());
    }

    #[test]
    fn test_forecast_response_to_report() {
        let body: ForecastResponse = serde_json::from_str(FORECAST_TWO_DAYS).unwrap();
        let report = body.into_report();
        assert_eq!(report.name, "Austin");
        assert_eq!(report.region, "Texas");
        assert_eq!(report.forecast.len(), 2);

        let first = &report.forecast[0];
        assert_eq!(first.date, "2026-10-16");
        assert_eq!(first.day.avghumidity, 58);
        assert_eq!(first.day.condition.code, 1000);
        assert_eq!(first.hour.len(), 1);
        assert_eq!(first.hour[0].humidity, 70);

        let second = &report.forecast[1];
        assert_eq!(second.day.daily_chance_of_rain, 80);
        assert!(second.hour.is_empty());
    }

    #[test]
    fn test_forecast_serializes_provider_field_names() {
        let body: ForecastResponse = serde_json::from_str(FORECAST_TWO_DAYS).unwrap();
        let json = serde_json::to_value(body.into_report()).unwrap();
        assert_eq!(json["name"], "Austin");
        assert_eq!(json["forecast"][0]["day"]["maxtemp_f"], 86.2);
        assert_eq!(json["forecast"][0]["hour"][0]["temp_c"], 20.0);
    }

    #[test]
    fn test_missing_key_fails_before_network() {
        let client = WeatherApiClient::new(
            HttpClient::new(Duration::from_secs(1)),
            "http://127.0.0.1:9",
            Some("   ".into()),
        );
        let err = client
            .current_conditions(&LocationQuery::Name("London".into()), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, UpstreamError::MissingApiKey("WeatherAPI")));
    }
}
