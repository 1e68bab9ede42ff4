//! Alert recipient directory entries.

use serde::{Deserialize, Serialize};

/// Role receiving alert emails from authorities.
pub const ROLE_AUTHORITY: &str = "authority";
/// Role receiving alert emails as a non-governmental organisation.
pub const ROLE_NGO: &str = "ngo";

/// A contact that alerts fan out to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Recipient {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// Email address, if present and non-blank.
    pub fn email_address(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    /// Phone number, if present and non-blank.
    pub fn phone_number(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}
