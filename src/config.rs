//! Runtime configuration: provider keys and endpoints, time limits, storage.
//!
//! Every value can come from a flag or the matching environment variable.

use clap::Args;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::nearby::{geocoding, NearbyCitiesResolver, OpenWeatherClient, ResolveSettings};
use crate::saved::SavedCityStore;
use crate::upstream::HttpClient;
use crate::weather::{weatherapi, WeatherApiClient};

#[derive(Args, Clone)]
pub struct ConfigArgs {
    /// WeatherAPI.com key (current conditions, forecasts, region checks).
    #[arg(long, global = true, env = "WEATHERAPI_KEY", hide_env_values = true)]
    pub weatherapi_key: Option<String>,

    /// OpenWeatherMap key (nearby-city search).
    #[arg(long, global = true, env = "OPENWEATHER_KEY", hide_env_values = true)]
    pub openweather_key: Option<String>,

    #[arg(long, global = true, env = "WEATHERAPI_URL", default_value = weatherapi::DEFAULT_BASE_URL)]
    pub weatherapi_url: String,

    #[arg(long, global = true, env = "OPENWEATHER_URL", default_value = geocoding::DEFAULT_BASE_URL)]
    pub openweather_url: String,

    /// Timeout for any single upstream call, in seconds.
    #[arg(long, global = true, env = "CALL_TIMEOUT_SECS", default_value_t = 5)]
    pub call_timeout_secs: u64,

    /// Overall deadline for one nearby-cities request, in seconds.
    #[arg(long, global = true, env = "REQUEST_DEADLINE_SECS", default_value_t = 30)]
    pub request_deadline_secs: u64,

    /// SQLite file for saved cities [default: ~/.weather-dashboard/saved_cities.db]
    #[arg(long, global = true, env = "SAVED_CITIES_DB")]
    pub database: Option<PathBuf>,
}

#[derive(Clone)]
pub struct Config {
    pub weatherapi_key: Option<String>,
    pub openweather_key: Option<String>,
    pub weatherapi_url: String,
    pub openweather_url: String,
    pub call_timeout: Duration,
    pub request_deadline: Duration,
    pub database: PathBuf,
}

impl From<ConfigArgs> for Config {
    fn from(args: ConfigArgs) -> Self {
        Self {
            weatherapi_key: args.weatherapi_key,
            openweather_key: args.openweather_key,
            weatherapi_url: args.weatherapi_url,
            openweather_url: args.openweather_url,
            call_timeout: Duration::from_secs(args.call_timeout_secs),
            request_deadline: Duration::from_secs(args.request_deadline_secs),
            database: args.database.unwrap_or_else(SavedCityStore::default_path),
        }
    }
}

/// Keys are reported as set or unset, never printed.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Config")
            .field("weatherapi_key", &redact(&self.weatherapi_key))
            .field("openweather_key", &redact(&self.openweather_key))
            .field("weatherapi_url", &self.weatherapi_url)
            .field("openweather_url", &self.openweather_url)
            .field("call_timeout", &self.call_timeout)
            .field("request_deadline", &self.request_deadline)
            .field("database", &self.database)
            .finish()
    }
}

impl Config {
    pub fn resolve_settings(&self) -> ResolveSettings {
        ResolveSettings {
            call_timeout: self.call_timeout,
            request_deadline: self.request_deadline,
        }
    }

    pub fn http_client(&self) -> HttpClient {
        HttpClient::new(self.call_timeout)
    }

    pub fn weather_client(&self, http: &HttpClient) -> WeatherApiClient {
        WeatherApiClient::new(
            http.clone(),
            self.weatherapi_url.clone(),
            self.weatherapi_key.clone(),
        )
    }

    pub fn geocoding_client(&self, http: &HttpClient) -> OpenWeatherClient {
        OpenWeatherClient::new(
            http.clone(),
            self.openweather_url.clone(),
            self.openweather_key.clone(),
        )
    }

    /// Resolver wired to the real providers.
    pub fn nearby_resolver(&self) -> NearbyCitiesResolver {
        let http = self.http_client();
        NearbyCitiesResolver::new(
            Arc::new(self.geocoding_client(&http)),
            Arc::new(self.weather_client(&http)),
            self.resolve_settings(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::try_parse_from([
            "test",
            "--weatherapi-key",
            "wk",
            "--openweather-key",
            "ok",
            "--call-timeout-secs",
            "2",
            "--request-deadline-secs",
            "12",
            "--database",
            "/tmp/cities.db",
            "--weatherapi-url",
            "http://localhost:9000/",
        ])
        .unwrap();
        let config = Config::from(cli.config);

        assert_eq!(config.weatherapi_key.as_deref(), Some("wk"));
        assert_eq!(config.openweather_key.as_deref(), Some("ok"));
        assert_eq!(config.call_timeout, Duration::from_secs(2));
        assert_eq!(config.resolve_settings().request_deadline, Duration::from_secs(12));
        assert_eq!(config.database, PathBuf::from("/tmp/cities.db"));
        assert_eq!(config.weatherapi_url, "http://localhost:9000/");
    }

    #[test]
    fn test_debug_hides_api_keys() {
        let cli = TestCli::try_parse_from(["test", "--weatherapi-key", "secret-wk-123"]).unwrap();
        let shown = format!("{:?}", Config::from(cli.config));
        assert!(!shown.contains("secret-wk-123"));
        assert!(shown.contains("weatherapi_key: \"<set>\""));
        assert!(shown.contains("openweather_key: \"<unset>\""));
    }

    #[test]
    fn test_default_database_under_home() {
        let path = SavedCityStore::default_path();
        assert!(path.ends_with(".weather-dashboard/saved_cities.db"));
    }

    #[test]
    fn test_rejects_non_numeric_timeout() {
        assert!(TestCli::try_parse_from(["test", "--call-timeout-secs", "soon"]).is_err());
    }
}
