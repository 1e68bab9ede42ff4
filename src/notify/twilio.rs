//! Twilio SMS transport over the REST API.

use async_trait::async_trait;
use serde::Deserialize;

use super::{NotifyError, SmsMessage, SmsTransport};
use crate::config::TwilioConfig;

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResource {
    #[serde(default)]
    message: Option<String>,
}

/// Posts messages to `/2010-04-01/Accounts/{sid}/Messages.json`.
pub struct TwilioClient {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base: String,
}

impl TwilioClient {
    /// Build a client from config. Returns `None` when credentials are missing.
    pub fn from_config(config: &TwilioConfig, http: reqwest::Client) -> Option<Self> {
        Some(Self {
            http,
            account_sid: config.account_sid.clone()?,
            auth_token: config.auth_token.clone()?,
            from_number: config.from_number.clone()?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[async_trait]
impl SmsTransport for TwilioClient {
    async fn send_sms(&self, message: &SmsMessage) -> Result<String, NotifyError> {
        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", message.to.as_str()),
                ("From", self.from_number.as_str()),
                ("Body", message.body.as_str()),
            ])
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResource>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| status.to_string());
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|e| NotifyError::Transport(format!("unexpected response: {}", e)))?;
        tracing::debug!("SMS {} queued for {}", resource.sid, message.to);
        Ok(resource.sid)
    }
}
