//! Report creation, search and export.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use super::{created, required, success, ApiResult};
use crate::errors::AppError;
use crate::export;
use crate::models::{CreateReportRequest, NewReport, Report, ReportSearchQuery};
use crate::AppState;

/// Read a report value from JSON. Numeric strings are accepted.
fn parse_value(raw: Option<&Value>) -> Result<f64, AppError> {
    let value = match raw {
        None | Some(Value::Null) => {
            return Err(AppError::Validation("Value is required".to_string()))
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::Validation("Value must be a finite number".to_string()))
}

/// POST /api/reports - Record a metric reading.
pub async fn create_report(
    State(state): State<AppState>,
    Json(request): Json<CreateReportRequest>,
) -> ApiResult<Report> {
    let report = NewReport {
        city: required(Some(request.city.as_str()), "City")?.to_string(),
        metric: required(Some(request.metric.as_str()), "Metric")?.to_string(),
        value: parse_value(request.value.as_ref())?,
        timestamp: request.timestamp,
    };

    created(state.repo.create_report(&report).await?)
}

/// GET /search?city= - Reports for one city, or all reports without a city.
pub async fn search_reports(
    State(state): State<AppState>,
    Query(query): Query<ReportSearchQuery>,
) -> ApiResult<Vec<Report>> {
    success(state.repo.list_reports(query.city.as_deref()).await?)
}

/// GET /export/csv - Download every report as CSV.
pub async fn export_csv(State(state): State<AppState>) -> Result<Response, AppError> {
    let reports = state.repo.list_reports(None).await?;
    let body = export::reports_to_csv(&reports)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"reports.csv\""),
        ],
        body,
    )
        .into_response())
}

/// GET /export/pdf - Download every report as PDF.
pub async fn export_pdf(State(state): State<AppState>) -> Result<Response, AppError> {
    let reports = state.repo.list_reports(None).await?;
    let body = tokio::task::spawn_blocking(move || export::reports_to_pdf(&reports))
        .await
        .map_err(|e| AppError::Internal(format!("Worker task failed: {}", e)))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"reports.pdf\""),
        ],
        body,
    )
        .into_response())
}
