//! Subscription billing models.

use serde::{Deserialize, Serialize};

/// A hosted checkout session created by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// A hosted billing portal session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingPortal {
    pub url: String,
}

/// Plan confirmation after checkout or a beta unlock.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanConfirmation {
    pub plan: String,
}

/// Feedback submitted from the in-app beta banner.
#[derive(Debug, Clone, Serialize)]
pub struct BetaFeedback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}
