//! REST API module.
//!
//! Contains all API routes and handlers.

mod alerts;
mod notifications;
mod proxy;
mod reports;
mod users;

pub use alerts::*;
pub use notifications::*;
pub use proxy::*;
pub use reports::*;
pub use users::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip)]
    pub status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, status: StatusCode) -> Self {
        Self {
            success: true,
            data,
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a 200 response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data, StatusCode::OK))
}

/// Create a 201 response.
pub fn created<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data, StatusCode::CREATED))
}

/// Return the trimmed value of a required text field, or a validation error.
pub(crate) fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
