//! Direct email/SMS endpoints and the recipient directory.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{required, success, ApiResult};
use crate::errors::AppError;
use crate::models::{MessageResponse, Recipient};
use crate::notify::{EmailMessage, SmsMessage};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SmsRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SmsSent {
    pub sid: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// POST /api/notifications/sms - Send one text message.
pub async fn send_sms(
    State(state): State<AppState>,
    Json(request): Json<SmsRequest>,
) -> ApiResult<SmsSent> {
    let message = SmsMessage {
        to: required(request.to.as_deref(), "Recipient number")?.to_string(),
        body: required(request.message.as_deref(), "Message")?.to_string(),
    };

    let sid = state
        .dispatcher
        .sms_transport()
        .send_sms(&message)
        .await
        .map_err(|e| AppError::Notification(format!("Failed to send SMS: {}", e)))?;

    success(SmsSent { sid })
}

/// POST /api/notifications/email - Send one email.
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> ApiResult<MessageResponse> {
    let message = EmailMessage {
        to: required(request.to.as_deref(), "Recipient address")?.to_string(),
        subject: required(request.subject.as_deref(), "Subject")?.to_string(),
        body: required(request.message.as_deref(), "Message")?.to_string(),
    };

    state
        .dispatcher
        .email_transport()
        .send_email(&message)
        .await
        .map_err(|e| AppError::Notification(format!("Failed to send email: {}", e)))?;

    success(MessageResponse::new("Email sent successfully"))
}

/// GET /api/recipients - The directory alerts fan out to.
pub async fn list_recipients(State(state): State<AppState>) -> ApiResult<Vec<Recipient>> {
    success(state.dispatcher.directory().all().to_vec())
}
