//! Client for the upstream services proxied by the API.
//!
//! Responses are passed through as raw JSON; nothing is cached or retried.

use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::errors::AppError;

/// HTTP client bound to the configured upstream endpoints.
pub struct UpstreamClient {
    http: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(http: Client, config: UpstreamConfig) -> Self {
        Self { http, config }
    }

    /// Build the shared HTTP client with the configured request timeout.
    pub fn http_client(config: &UpstreamConfig) -> Result<Client, reqwest::Error> {
        Client::builder().timeout(config.timeout).build()
    }

    /// Latest water level from the tide-gauge provider.
    pub async fn sea_level(&self, station: Option<&str>) -> Result<Value, AppError> {
        let station = station
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.config.sea_level_station.as_str());

        let request = self.http.get(&self.config.sea_level_url).query(&[
            ("product", "water_level"),
            ("date", "latest"),
            ("station", station),
            ("time_zone", "gmt"),
            ("units", "metric"),
            ("format", "json"),
        ]);
        fetch_json(request, "Failed to fetch sea level data").await
    }

    /// Current weather and hourly surface pressure for a coordinate.
    pub async fn weather(&self, lat: f64, lon: f64) -> Result<Value, AppError> {
        let request = self.http.get(&self.config.weather_url).query(&[
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("current_weather", "true".to_string()),
            ("hourly", "surface_pressure".to_string()),
        ]);
        fetch_json(request, "Failed to fetch weather data").await
    }

    /// Flood prediction; the body is forwarded untouched.
    pub async fn predict(&self, input: &Value) -> Result<Value, AppError> {
        let request = self.http.post(&self.config.predict_url).json(input);
        fetch_json(request, "Prediction failed").await
    }

    /// Cyclone anomaly prediction; the body is forwarded untouched.
    pub async fn cyclone(&self, input: &Value) -> Result<Value, AppError> {
        let request = self.http.post(&self.config.cyclone_url).json(input);
        fetch_json(request, "Cyclone prediction failed").await
    }
}

/// Send a request and return its JSON body, mapping every failure to `Upstream`.
async fn fetch_json(request: RequestBuilder, context: &str) -> Result<Value, AppError> {
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!("{}: upstream answered {}", context, status);
        return Err(AppError::Upstream {
            message: format!("{}: upstream answered {}", context, status),
            status: Some(status.as_u16()),
        });
    }

    response.json::<Value>().await.map_err(|e| {
        tracing::error!("{}: {}", context, e);
        AppError::Upstream {
            message: format!("{}: invalid JSON from upstream", context),
            status: Some(status.as_u16()),
        }
    })
}
