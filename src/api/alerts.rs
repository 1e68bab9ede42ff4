//! Alert API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{created, required, success, ApiResult};
use crate::db::ALERT_LIST_LIMIT;
use crate::errors::AppError;
use crate::models::{
    Alert, CreateAlertRequest, CreatedAlert, MessageResponse, NewAlert, Severity,
    UpdateAlertRequest,
};
use crate::notify::AlertNotice;
use crate::AppState;

const DEFAULT_STATUS: &str = "sent";

fn parse_severity(raw: &str) -> Result<Severity, AppError> {
    Severity::parse(raw).ok_or_else(|| {
        AppError::Validation(format!(
            "Unknown severity '{}': expected Low, Medium, High or Critical",
            raw
        ))
    })
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A field that may be omitted but, when sent, must not be blank. Returns it trimmed.
fn required_if_present(value: Option<String>, field: &str) -> Result<Option<String>, AppError> {
    value
        .map(|v| required(Some(v.as_str()), field).map(str::to_string))
        .transpose()
}

/// GET /api/alerts - List the 50 most recent alerts.
pub async fn list_alerts(State(state): State<AppState>) -> ApiResult<Vec<Alert>> {
    success(state.repo.list_recent_alerts(ALERT_LIST_LIMIT).await?)
}

/// GET /api/alerts/:id - Get a single alert.
pub async fn get_alert(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Alert> {
    match state.repo.get_alert(&id).await? {
        Some(alert) => success(alert),
        None => Err(AppError::NotFound(format!("Alert {} not found", id))),
    }
}

/// POST /api/alerts - Validate, fan out to recipients, then persist.
pub async fn create_alert(
    State(state): State<AppState>,
    Json(request): Json<CreateAlertRequest>,
) -> ApiResult<CreatedAlert> {
    let severity = parse_severity(required(request.severity.as_deref(), "Severity")?)?;
    let title = required(request.title.as_deref(), "Title")?.to_string();
    let description = required(request.description.as_deref(), "Description")?.to_string();
    let location = optional_text(request.location);

    let mut alert = NewAlert {
        severity,
        kind: optional_text(request.kind),
        title,
        description,
        location,
        recipients: request.recipients.unwrap_or_default(),
        status: optional_text(request.status).unwrap_or_else(|| DEFAULT_STATUS.to_string()),
    };

    let dispatch = if request.notify {
        let notice = AlertNotice {
            severity: alert.severity,
            title: alert.title.clone(),
            description: alert.description.clone(),
            location: alert.location.clone(),
        };
        let report = state.dispatcher.dispatch(&notice).await;
        alert.recipients = report.delivered_addresses();
        alert.status = report.status.clone();
        Some(report)
    } else {
        None
    };

    let alert = state.repo.create_alert(&alert).await?;
    tracing::info!(
        "Created alert {} ({}, status {})",
        alert.id,
        alert.severity.as_str(),
        alert.status
    );

    created(CreatedAlert { alert, dispatch })
}

/// PUT /api/alerts/:id - Partially update an alert.
pub async fn update_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut request): Json<UpdateAlertRequest>,
) -> ApiResult<Alert> {
    let severity = match request.severity.as_deref() {
        Some(raw) => Some(parse_severity(raw)?),
        None => None,
    };

    // Same normalization as creation; blank optional fields leave the stored value alone.
    request.title = required_if_present(request.title.take(), "Title")?;
    request.description = required_if_present(request.description.take(), "Description")?;
    request.status = required_if_present(request.status.take(), "Status")?;
    request.kind = optional_text(request.kind.take());
    request.location = optional_text(request.location.take());

    success(state.repo.update_alert(&id, &request, severity).await?)
}

/// DELETE /api/alerts/:id - Delete an alert.
pub async fn delete_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    state.repo.delete_alert(&id).await?;
    tracing::info!("Deleted alert {}", id);
    success(MessageResponse::new("Alert deleted successfully"))
}
