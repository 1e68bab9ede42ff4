//! Alert model and request bodies.

use serde::{Deserialize, Serialize};

use super::DispatchReport;

/// Threat severity level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }

    /// Parse a severity, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// A persisted threat notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub severity: Severity,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub sent_at: String,
    pub recipients: Vec<String>,
    pub status: String,
}

/// Request body for creating an alert.
///
/// Fields are optional at the serde level so that missing values surface as
/// validation errors rather than extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Only honored when `notify` is false.
    #[serde(default)]
    pub recipients: Option<Vec<String>>,
    /// Only honored when `notify` is false.
    #[serde(default)]
    pub status: Option<String>,
    /// Fan the alert out to the recipient directory (default true).
    #[serde(default = "default_notify")]
    pub notify: bool,
}

fn default_notify() -> bool {
    true
}

/// Validated alert ready to be dispatched and stored.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub severity: Severity,
    pub kind: Option<String>,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub recipients: Vec<String>,
    pub status: String,
}

/// Request body for updating an existing alert. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlertRequest {
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub recipients: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Response body for alert creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAlert {
    pub alert: Alert,
    pub dispatch: Option<DispatchReport>,
}
