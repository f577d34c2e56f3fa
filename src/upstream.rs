//! Shared plumbing for third-party HTTP calls.
//!
//! All provider calls are blocking (ureq) and carry an explicit timeout.
//! Callers on the async side hand them to the blocking pool.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("WeatherDashboard/", env!("CARGO_PKG_VERSION"));

/// Failures talking to an upstream provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid provider response: {0}")]
    Decode(String),
    #[error("request deadline exceeded")]
    DeadlineExceeded,
    #[error("no API key configured for {0}")]
    MissingApiKey(&'static str),
}

/// Thin wrapper over a shared ureq agent.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(default_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(default_timeout)
            .user_agent(USER_AGENT)
            .build();
        Self { agent }
    }

    /// GET `url` with the given query pairs and decode the JSON body.
    pub fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T, UpstreamError> {
        if timeout.is_zero() {
            return Err(UpstreamError::DeadlineExceeded);
        }

        let mut request = self.agent.get(url).timeout(timeout);
        for (key, value) in query {
            request = request.query(key, value);
        }

        let response = request.call().map_err(|e| match e {
            ureq::Error::Status(status, response) => UpstreamError::Status {
                status,
                message: error_message(response),
            },
            ureq::Error::Transport(t) => UpstreamError::Transport(t.to_string()),
        })?;

        response
            .into_json()
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

/// Error payload shapes used by the two providers:
/// WeatherAPI: `{"error": {"code": 1006, "message": "..."}}`
/// OpenWeatherMap: `{"cod": "401", "message": "..."}`
#[derive(Deserialize)]
struct ErrorPayload {
    error: Option<NestedError>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct NestedError {
    message: String,
}

fn error_message(response: ureq::Response) -> String {
    let body = response.into_string().unwrap_or_default();
    parse_error_message(&body)
}

fn parse_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorPayload>(body) {
        Ok(ErrorPayload { error: Some(e), .. }) => e.message,
        Ok(ErrorPayload { message: Some(m), .. }) => m,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().chars().take(200).collect(),
    }
}

/// Accepts integers the providers sometimes encode as floats (`67.0`).
pub(crate) fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.round() as i64)
}
