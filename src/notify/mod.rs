//! Outbound notifications.
//!
//! Email and SMS go through the [`EmailTransport`] and [`SmsTransport`]
//! traits so the dispatcher can be exercised without real providers.

mod directory;
mod dispatcher;
mod smtp;
mod twilio;

pub use directory::*;
pub use dispatcher::*;
pub use smtp::SmtpTransport;
pub use twilio::TwilioClient;

use std::fmt;

use async_trait::async_trait;

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// A text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
}

/// Transport-level failure.
#[derive(Debug)]
pub enum NotifyError {
    /// Credentials for the channel were never configured
    NotConfigured(&'static str),
    /// Message could not be built (bad address etc.)
    InvalidMessage(String),
    /// Provider unreachable or connection failed
    Transport(String),
    /// Provider answered with an error
    Rejected { status: u16, message: String },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::NotConfigured(channel) => write!(f, "{} transport is not configured", channel),
            NotifyError::InvalidMessage(msg) => write!(f, "invalid message: {}", msg),
            NotifyError::Transport(msg) => write!(f, "transport error: {}", msg),
            NotifyError::Rejected { status, message } => {
                write!(f, "provider rejected message ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for NotifyError {}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

#[async_trait]
pub trait SmsTransport: Send + Sync {
    /// Send a text message, returning the provider's message id.
    async fn send_sms(&self, message: &SmsMessage) -> Result<String, NotifyError>;
}

/// Stand-in for a channel without credentials: every send fails.
pub struct Unconfigured;

#[async_trait]
impl EmailTransport for Unconfigured {
    async fn send_email(&self, _message: &EmailMessage) -> Result<(), NotifyError> {
        Err(NotifyError::NotConfigured("email"))
    }
}

#[async_trait]
impl SmsTransport for Unconfigured {
    async fn send_sms(&self, _message: &SmsMessage) -> Result<String, NotifyError> {
        Err(NotifyError::NotConfigured("sms"))
    }
}
