//! Environmental report model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single metric reading for a city.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub city: String,
    /// e.g. rain, tide, pollution
    pub metric: String,
    pub value: f64,
    pub timestamp: String,
}

/// Request body for creating a report.
///
/// `value` is kept as raw JSON so that a missing or non-numeric value is a
/// validation error rather than an extractor rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub metric: String,
    #[serde(default)]
    pub value: Option<Value>,
    /// RFC 3339; defaults to now.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Validated report ready to be stored.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub city: String,
    pub metric: String,
    pub value: f64,
    pub timestamp: Option<String>,
}

/// Query parameters for report search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportSearchQuery {
    #[serde(default)]
    pub city: Option<String>,
}
