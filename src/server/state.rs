use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::nearby::NearbyCitiesResolver;
use crate::saved::{SavedCityService, SavedCityStore, StoreError};
use crate::weather::WeatherLookupClient;

pub struct AppState {
    pub resolver: NearbyCitiesResolver,
    pub weather: Arc<dyn WeatherLookupClient>,
    pub saved: SavedCityService,
    pub call_timeout: Duration,
}

impl AppState {
    /// Wire the real providers and open the saved-cities database.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let http = config.http_client();
        let weather: Arc<dyn WeatherLookupClient> = Arc::new(config.weather_client(&http));
        let geocoder = Arc::new(config.geocoding_client(&http));
        let store = Arc::new(SavedCityStore::open(&config.database)?);

        Ok(Self {
            resolver: NearbyCitiesResolver::new(geocoder, weather.clone(), config.resolve_settings()),
            saved: SavedCityService::new(store, weather.clone(), config.call_timeout),
            weather,
            call_timeout: config.call_timeout,
        })
    }
}
