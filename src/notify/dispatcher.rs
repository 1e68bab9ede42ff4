//! Alert fan-out to the recipient directory.
//!
//! Emails go to recipients holding an email role; texts go to everyone with a
//! phone number. Each delivery runs in its own task and fails on its own.

use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{
    Channel, DeliveryOutcome, DeliveryStatus, DispatchReport, Severity, ROLE_AUTHORITY, ROLE_NGO,
};

use super::{
    EmailMessage, EmailTransport, NotifyError, RecipientDirectory, SmsMessage, SmsTransport,
};

/// Roles that receive alert emails, in send order.
pub const EMAIL_ROLES: [&str; 2] = [ROLE_AUTHORITY, ROLE_NGO];

/// Content of an alert to be fanned out.
#[derive(Debug, Clone)]
pub struct AlertNotice {
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
}

impl AlertNotice {
    pub fn subject(&self) -> String {
        format!(
            "[ALERT - {}] {}",
            self.severity.as_str().to_uppercase(),
            self.title
        )
    }

    pub fn body(&self) -> String {
        match self.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            Some(location) => format!("{}\nLocation: {}", self.description, location),
            None => self.description.clone(),
        }
    }

    pub fn sms_text(&self) -> String {
        format!("{}\n{}", self.subject(), self.body())
    }
}

/// Who a delivery is for, known before it runs.
#[derive(Debug, Clone)]
struct DeliveryTarget {
    recipient: String,
    channel: Channel,
    address: String,
}

impl DeliveryTarget {
    fn outcome(self, result: Result<Option<String>, String>) -> DeliveryOutcome {
        let (status, provider_id, error) = match result {
            Ok(provider_id) => (DeliveryStatus::Sent, provider_id, None),
            Err(e) => (DeliveryStatus::Failed, None, Some(e)),
        };
        DeliveryOutcome {
            recipient: self.recipient,
            channel: self.channel,
            address: self.address,
            status,
            provider_id,
            error,
        }
    }
}

#[derive(Debug, Clone)]
enum Delivery {
    Email(EmailMessage),
    Sms(SmsMessage),
}

impl Delivery {
    async fn send(
        self,
        email: &dyn EmailTransport,
        sms: &dyn SmsTransport,
    ) -> Result<Option<String>, NotifyError> {
        match self {
            Delivery::Email(message) => email.send_email(&message).await.map(|()| None),
            Delivery::Sms(message) => sms.send_sms(&message).await.map(Some),
        }
    }
}

/// Fans alerts out over email and SMS.
pub struct Dispatcher {
    directory: Arc<RecipientDirectory>,
    email: Arc<dyn EmailTransport>,
    sms: Arc<dyn SmsTransport>,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<RecipientDirectory>,
        email: Arc<dyn EmailTransport>,
        sms: Arc<dyn SmsTransport>,
    ) -> Self {
        Self {
            directory,
            email,
            sms,
        }
    }

    pub fn directory(&self) -> &RecipientDirectory {
        &self.directory
    }

    pub fn email_transport(&self) -> &dyn EmailTransport {
        self.email.as_ref()
    }

    pub fn sms_transport(&self) -> &dyn SmsTransport {
        self.sms.as_ref()
    }

    /// Work out every delivery for a notice, in send order.
    fn plan(&self, notice: &AlertNotice) -> Vec<(DeliveryTarget, Delivery)> {
        let subject = notice.subject();
        let body = notice.body();
        let mut planned = Vec::new();

        // One email per address, whatever its case or how many roles hold it.
        let mut emailed: HashSet<String> = HashSet::new();
        for role in EMAIL_ROLES {
            for recipient in self.directory.with_role(role) {
                let Some(address) = recipient.email_address() else {
                    continue;
                };
                if !emailed.insert(address.to_lowercase()) {
                    continue;
                }
                planned.push((
                    DeliveryTarget {
                        recipient: recipient.name.clone(),
                        channel: Channel::Email,
                        address: address.to_string(),
                    },
                    Delivery::Email(EmailMessage {
                        to: address.to_string(),
                        subject: subject.clone(),
                        body: body.clone(),
                    }),
                ));
            }
        }

        let text = notice.sms_text();
        for recipient in self.directory.all() {
            let Some(phone) = recipient.phone_number() else {
                continue;
            };
            planned.push((
                DeliveryTarget {
                    recipient: recipient.name.clone(),
                    channel: Channel::Sms,
                    address: phone.to_string(),
                },
                Delivery::Sms(SmsMessage {
                    to: phone.to_string(),
                    body: text.clone(),
                }),
            ));
        }

        planned
    }

    /// Send every planned delivery concurrently and report each outcome.
    pub async fn dispatch(&self, notice: &AlertNotice) -> DispatchReport {
        let mut targets = Vec::new();
        let mut handles = Vec::new();

        for (target, delivery) in self.plan(notice) {
            let email = Arc::clone(&self.email);
            let sms = Arc::clone(&self.sms);
            handles.push(tokio::spawn(async move {
                delivery.send(email.as_ref(), sms.as_ref()).await
            }));
            targets.push(target);
        }

        let results = futures::future::join_all(handles).await;

        let outcomes: Vec<DeliveryOutcome> = targets
            .into_iter()
            .zip(results)
            .map(|(target, joined)| {
                let result = match joined {
                    Ok(Ok(provider_id)) => Ok(provider_id),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(e) => Err(format!("delivery task failed: {}", e)),
                };
                if let Err(e) = &result {
                    tracing::warn!(
                        recipient = %target.recipient,
                        channel = ?target.channel,
                        "Alert delivery failed: {}",
                        e
                    );
                }
                target.outcome(result)
            })
            .collect();

        let report = DispatchReport::from_outcomes(outcomes);
        tracing::info!(
            sent = report.sent,
            failed = report.failed,
            "Dispatched alert \"{}\"",
            notice.title
        );
        report
    }
}
