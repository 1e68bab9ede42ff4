//! SMTP email transport.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{EmailMessage, EmailTransport, NotifyError};
use crate::config::SmtpConfig;

/// Sends mail through an authenticated SMTP relay (implicit TLS).
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    /// Build a transport from config. Returns `None` when credentials are missing.
    pub fn from_config(config: &SmtpConfig) -> Result<Option<Self>, NotifyError> {
        let (Some(username), Some(password), Some(from)) =
            (&config.username, &config.password, &config.from)
        else {
            return Ok(None);
        };

        let from: Mailbox = from
            .parse()
            .map_err(|e| NotifyError::InvalidMessage(format!("sender {}: {}", from, e)))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(username.clone(), password.clone()))
            .build();

        Ok(Some(Self { mailer, from }))
    }

    fn build(&self, message: &EmailMessage) -> Result<Message, NotifyError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| NotifyError::InvalidMessage(format!("recipient {}: {}", message.to, e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .body(message.body.clone())
            .map_err(|e| NotifyError::InvalidMessage(e.to_string()))
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let email = self.build(message)?;
        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        tracing::debug!("Email sent to {}", message.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.org".into(),
            port: 465,
            username: Some("alerts@example.org".into()),
            password: Some("secret".into()),
            from: Some("Coastal Alerts <alerts@example.org>".into()),
        }
    }

    #[test]
    fn test_missing_credentials_yield_none() {
        let mut cfg = config();
        cfg.password = None;
        assert!(SmtpTransport::from_config(&cfg).unwrap().is_none());
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let mut cfg = config();
        cfg.from = Some("not an address".into());
        assert!(matches!(
            SmtpTransport::from_config(&cfg),
            Err(NotifyError::InvalidMessage(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_recipient_fails_before_connecting() {
        let transport = SmtpTransport::from_config(&config()).unwrap().unwrap();
        let err = transport
            .send_email(&EmailMessage {
                to: "nobody".into(),
                subject: "s".into(),
                body: "b".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::InvalidMessage(_)));
    }
}
