//! Outcome of fanning an alert out to recipients.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// Result of one email or SMS attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub recipient: String,
    pub channel: Channel,
    pub address: String,
    pub status: DeliveryStatus,
    /// Provider message id (SMS only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-delivery outcomes of a dispatch plus aggregate counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub status: String,
    pub sent: usize,
    pub failed: usize,
    pub deliveries: Vec<DeliveryOutcome>,
}

impl DispatchReport {
    pub fn from_outcomes(deliveries: Vec<DeliveryOutcome>) -> Self {
        let sent = deliveries
            .iter()
            .filter(|d| d.status == DeliveryStatus::Sent)
            .count();
        let failed = deliveries.len() - sent;
        let status = match (sent, failed) {
            (_, 0) => "sent",
            (0, _) => "failed",
            _ => "partial",
        };

        Self {
            status: status.to_string(),
            sent,
            failed,
            deliveries,
        }
    }

    /// Distinct addresses that were actually delivered to, in attempt order.
    pub fn delivered_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = Vec::new();
        for d in &self.deliveries {
            if d.status == DeliveryStatus::Sent && !addresses.contains(&d.address) {
                addresses.push(d.address.clone());
            }
        }
        addresses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(address: &str, status: DeliveryStatus) -> DeliveryOutcome {
        DeliveryOutcome {
            recipient: "r".into(),
            channel: Channel::Sms,
            address: address.into(),
            status,
            provider_id: None,
            error: None,
        }
    }

    #[test]
    fn test_aggregate_status() {
        assert_eq!(DispatchReport::from_outcomes(vec![]).status, "sent");

        let all_ok = DispatchReport::from_outcomes(vec![outcome("a", DeliveryStatus::Sent)]);
        assert_eq!(all_ok.status, "sent");
        assert_eq!(all_ok.sent, 1);

        let mixed = DispatchReport::from_outcomes(vec![
            outcome("a", DeliveryStatus::Sent),
            outcome("b", DeliveryStatus::Failed),
        ]);
        assert_eq!(mixed.status, "partial");
        assert_eq!(mixed.failed, 1);

        let none = DispatchReport::from_outcomes(vec![outcome("b", DeliveryStatus::Failed)]);
        assert_eq!(none.status, "failed");
    }

    #[test]
    fn test_delivered_addresses_deduplicates() {
        let report = DispatchReport::from_outcomes(vec![
            outcome("+15550001", DeliveryStatus::Sent),
            outcome("+15550001", DeliveryStatus::Sent),
            outcome("+15550002", DeliveryStatus::Failed),
            outcome("ops@example.com", DeliveryStatus::Sent),
        ]);
        assert_eq!(
            report.delivered_addresses(),
            vec!["+15550001".to_string(), "ops@example.com".to_string()]
        );
    }
}
