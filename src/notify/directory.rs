//! Recipient directory loaded from a JSON file at startup.

use std::path::Path;

use crate::models::Recipient;

/// Read-only list of alert recipients.
#[derive(Debug, Clone, Default)]
pub struct RecipientDirectory {
    recipients: Vec<Recipient>,
}

impl RecipientDirectory {
    pub fn new(recipients: Vec<Recipient>) -> Self {
        Self { recipients }
    }

    /// Load the directory from a JSON array of recipients.
    pub async fn load(path: &Path) -> Result<Self, std::io::Error> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{}: {}", path.display(), e),
            )
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let recipients: Vec<Recipient> = serde_json::from_str(raw)?;
        Ok(Self::new(recipients))
    }

    pub fn all(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn with_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a Recipient> + 'a {
        self.recipients.iter().filter(move |r| r.has_role(role))
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }
}
