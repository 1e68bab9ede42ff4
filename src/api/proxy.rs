//! Upstream proxy endpoints. Successful upstream JSON is returned verbatim.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SeaLevelQuery {
    #[serde(default)]
    pub station: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// GET /api/sea-level - Latest tide-gauge water level.
pub async fn sea_level(
    State(state): State<AppState>,
    Query(query): Query<SeaLevelQuery>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.upstream.sea_level(query.station.as_deref()).await?))
}

/// GET /api/weather?lat=&lon= - Current weather for a coordinate.
pub async fn weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<Value>, AppError> {
    let (Some(lat), Some(lon)) = (query.lat, query.lon) else {
        return Err(AppError::Validation("lat and lon are required".to_string()));
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(AppError::Validation("Coordinates out of range".to_string()));
    }

    Ok(Json(state.upstream.weather(lat, lon).await?))
}

/// POST /api/predict - Flood prediction.
pub async fn predict(
    State(state): State<AppState>,
    Json(input): Json<Value>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.upstream.predict(&input).await?))
}

/// POST /api/cyclone - Cyclone anomaly prediction.
pub async fn cyclone(
    State(state): State<AppState>,
    Json(input): Json<Value>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.upstream.cyclone(&input).await?))
}
