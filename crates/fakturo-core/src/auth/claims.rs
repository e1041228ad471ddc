//! Access-token payload inspection.
//!
//! The backend is the sole authority on token validity. The payload is
//! decoded here only to schedule proactive expiry handling; it is never an
//! input to an authorization decision.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Claims {
    exp: i64,
}

/// Extract the expiry instant from a JWT-style access token.
///
/// Returns `None` when the token is not three dot-separated segments, the
/// payload segment is not base64url, or the claims lack a numeric `exp`.
/// Callers fall back to reactive 401 detection in that case.
pub(crate) fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    segments.next()?;

    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Claims = serde_json::from_slice(&decoded).ok()?;
    Utc.timestamp_opt(claims.exp, 0).single()
}
