//! Account and credential models.

use serde::{Deserialize, Serialize};

/// Subscription tier of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Starter,
    Pro,
    Elite,
    /// Tier values introduced by the backend after this client shipped.
    #[serde(other)]
    Unknown,
}

impl PlanTier {
    /// Display label for the tier.
    pub fn label(&self) -> &'static str {
        match self {
            PlanTier::Starter => "Starter",
            PlanTier::Pro => "Pro",
            PlanTier::Elite => "Elite",
            PlanTier::Unknown => "Unknown",
        }
    }
}

/// An authenticated account holder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(rename = "companyName", default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanTier>,
}

/// Token pair and account record returned by register, login, and refresh.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSession {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    pub user: User,
}
