use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;
use weather_dashboard::config::{Config, ConfigArgs};
use weather_dashboard::nearby::NearbyCities;
use weather_dashboard::server::{self, AppState};
use weather_dashboard::weather::{
    validate_forecast_days, LocationQuery, WeatherLookupClient, MAX_FORECAST_DAYS,
};

/// Weather Dashboard: current conditions, forecasts, nearby cities and
/// saved cities.
///
/// Examples:
///   weather-dashboard serve --port 8080
///   weather-dashboard nearby --lat 51.5074 --lon -0.1278 --region England
///   weather-dashboard weather "New York"
///   weather-dashboard forecast Paris --days 2
#[derive(Parser)]
#[command(name = "weather-dashboard", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, short, default_value_t = 8080)]
        port: u16,
    },
    /// Print the cities nearest a point as JSON.
    Nearby {
        /// Latitude (-90 to 90).
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude (-180 to 180).
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Keep only cities in this state/region (cities within 5 km always kept).
        #[arg(long)]
        region: Option<String>,
    },
    /// Print current conditions for a city name or "lat,lon".
    Weather { query: String },
    /// Print a 1-4 day forecast for a city name or "lat,lon".
    Forecast {
        query: String,
        #[arg(long, short, default_value_t = 3)]
        days: i64,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from(cli.config);

    let result = match cli.command.unwrap_or(Command::Serve {
        host: "127.0.0.1".into(),
        port: 8080,
    }) {
        Command::Serve { host, port } => serve(&config, &host, port),
        Command::Nearby { lat, lon, region } => config
            .nearby_resolver()
            .resolve(lat, lon, region.as_deref())
            .map_err(|e| e.to_string())
            .and_then(|cities| print_json(&NearbyCities::from(cities))),
        Command::Weather { query } => {
            let http = config.http_client();
            config
                .weather_client(&http)
                .current_conditions(&parse_query(&query), config.call_timeout)
                .map_err(|e| format!("{} not found: {}", query, e))
                .and_then(|report| print_json(&report))
        }
        Command::Forecast { query, days } => match validate_forecast_days(days) {
            None => Err(format!(
                "Days parameter must be between 1 and {}",
                MAX_FORECAST_DAYS
            )),
            Some(days) => {
                let http = config.http_client();
                config
                    .weather_client(&http)
                    .forecast(&parse_query(&query), days, config.call_timeout)
                    .map_err(|e| format!("Failed to fetch forecast for {}: {}", query, e))
                    .and_then(|report| print_json(&report))
            }
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            error!("{}", msg);
            ExitCode::FAILURE
        }
    }
}

fn serve(config: &Config, host: &str, port: u16) -> Result<(), String> {
    let state = AppState::from_config(config).map_err(|e| {
        format!(
            "Cannot open saved-cities database {}: {}",
            config.database.display(),
            e
        )
    })?;

    let runtime = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
    runtime
        .block_on(server::start(Arc::new(state), host, port))
        .map_err(|e| format!("Server error on {}:{}: {}", host, port, e))
}

/// `"51.5,-0.12"` is looked up as coordinates, anything else by name.
fn parse_query(query: &str) -> LocationQuery {
    let coords = query.split_once(',').and_then(|(lat, lon)| {
        let lat = lat.trim().parse::<f64>().ok()?;
        let lon = lon.trim().parse::<f64>().ok()?;
        weather_dashboard::geo::Coordinate::new(lat, lon).ok()
    });
    match coords {
        Some(c) => LocationQuery::Coordinates(c),
        None => LocationQuery::Name(query.trim().to_string()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}
