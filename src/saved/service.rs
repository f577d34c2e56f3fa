//! Saved-city operations, including the live-weather listing.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::store::{SavedCity, SavedCityStore, StoreError};
use crate::geo::Coordinate;
use crate::weather::{LocationQuery, WeatherLookupClient, WeatherReport};

/// One entry of the saved-cities listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SavedCityView {
    WithWeather {
        id: i64,
        #[serde(flatten)]
        weather: WeatherReport,
    },
    Unavailable {
        id: i64,
        name: String,
        lat: f64,
        lon: f64,
        error: String,
    },
}

#[derive(Clone)]
pub struct SavedCityService {
    store: Arc<SavedCityStore>,
    weather: Arc<dyn WeatherLookupClient>,
    call_timeout: Duration,
}

impl SavedCityService {
    pub fn new(
        store: Arc<SavedCityStore>,
        weather: Arc<dyn WeatherLookupClient>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            weather,
            call_timeout,
        }
    }

    pub fn save_city(&self, name: &str, lat: f64, lon: f64) -> Result<SavedCity, StoreError> {
        let coord = Coordinate::new(lat, lon)?;
        self.store.insert(name, coord)
    }

    pub fn delete_city(&self, id: i64) -> Result<(), StoreError> {
        self.store.delete(id)
    }

    /// Every saved city with its current weather. Lookups go by stored
    /// coordinates so a same-named city elsewhere is never picked up.
    /// A failed lookup degrades that one entry, not the listing.
    pub fn list_with_weather(&self) -> Result<Vec<SavedCityView>, StoreError> {
        let cities = self.store.list()?;
        Ok(cities.into_iter().map(|c| self.with_weather(c)).collect())
    }

    fn with_weather(&self, city: SavedCity) -> SavedCityView {
        let lookup = city
            .coordinate()
            .map_err(|e| e.to_string())
            .and_then(|coord| {
                self.weather
                    .current_conditions(&LocationQuery::Coordinates(coord), self.call_timeout)
                    .map_err(|e| e.to_string())
            });

        match lookup {
            Ok(weather) => SavedCityView::WithWeather {
                id: city.id,
                weather,
            },
            Err(e) => {
                warn!(id = city.id, city = %city.city_name, error = %e, "weather lookup failed");
                SavedCityView::Unavailable {
                    id: city.id,
                    name: city.city_name,
                    lat: city.latitude,
                    lon: city.longitude,
                    error: format!("Failed to fetch weather: {}", e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UpstreamError;
    use crate::weather::ForecastReport;
    use serde_json::json;

    /// Reports "Austin" weather for anything south of 40°N, fails otherwise.
    struct SouthOnly;

    impl WeatherLookupClient for SouthOnly {
        fn current_conditions(
            &self,
            query: &LocationQuery,
            _timeout: Duration,
        ) -> Result<WeatherReport, UpstreamError> {
            match query {
                LocationQuery::Coordinates(c) if c.lat() < 40.0 => Ok(WeatherReport {
                    name: "Austin".into(),
                    region: "Texas".into(),
                    country: "United States of America".into(),
                    temp_f: 77.0,
                    temp_c: 25.0,
                    condition: "Sunny".into(),
                    humidity: 40,
                    wind_mph: 3.1,
                    lat: c.lat(),
                    lon: c.lon(),
                }),
                LocationQuery::Coordinates(_) => Err(UpstreamError::Transport("timed out".into())),
                LocationQuery::Name(_) => panic!("saved cities must be looked up by coordinates"),
            }
        }

        fn forecast(
            &self,
            _query: &LocationQuery,
            _days: u8,
            _timeout: Duration,
        ) -> Result<ForecastReport, UpstreamError> {
            Err(UpstreamError::Transport("not used".into()))
        }
    }

    fn service() -> SavedCityService {
        SavedCityService::new(
            Arc::new(SavedCityStore::in_memory().unwrap()),
            Arc::new(SouthOnly),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_save_rejects_invalid_coordinates() {
        let svc = service();
        let err = svc.save_city("Nowhere", 95.0, 0.0).unwrap_err();
        assert!(matches!(err, StoreError::InvalidCoordinate(_)));
        assert!(svc.list_with_weather().unwrap().is_empty());
    }

    #[test]
    fn test_list_with_weather_degrades_per_city() {
        let svc = service();
        let austin = svc.save_city("Austin", 30.2672, -97.7431).unwrap();
        let oslo = svc.save_city("Oslo", 59.9139, 10.7522).unwrap();

        let views = svc.list_with_weather().unwrap();
        assert_eq!(views.len(), 2);
        assert!(matches!(&views[0], SavedCityView::WithWeather { id, .. } if *id == austin.id));
        assert!(matches!(&views[1], SavedCityView::Unavailable { id, .. } if *id == oslo.id));

        let json = serde_json::to_value(&views).unwrap();
        assert_eq!(json[0]["id"], austin.id);
        assert_eq!(json[0]["region"], "Texas");
        assert_eq!(json[0]["temp_f"], 77.0);
        assert_eq!(json[1]["name"], "Oslo");
        assert_eq!(json[1]["lat"], 59.9139);
        assert_eq!(
            json[1]["error"],
            json!("Failed to fetch weather: network error: timed out")
        );
    }

    #[test]
    fn test_delete_unknown_city() {
        let svc = service();
        assert!(matches!(svc.delete_city(42), Err(StoreError::NotFound(42))));
    }
}
