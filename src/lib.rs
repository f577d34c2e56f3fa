//! Weather dashboard backend.
//!
//! Proxies WeatherAPI.com (current conditions, forecasts) and OpenWeatherMap
//! (nearby-city search), ranks nearby cities by distance with optional region
//! filtering, and keeps a small list of saved cities in SQLite.

pub mod config;
pub mod geo;
pub mod nearby;
pub mod saved;
pub mod server;
pub mod upstream;
pub mod weather;
