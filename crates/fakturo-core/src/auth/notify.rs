//! User-facing session notices.
//!
//! Forced sign-outs always surface a notice before state is cleared so the
//! user understands why they were signed out. The expired and unauthorized
//! variants carry distinct copy.

use tracing::warn;

/// A notice about the session that the UI should surface to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// The session reached its expiry time or the backend refused to renew it.
    Expired,
    /// The backend rejected a request as unauthenticated or unauthorized.
    Unauthorized { message: String },
}

impl SessionNotice {
    /// Copy shown to the user.
    pub fn message(&self) -> String {
        match self {
            SessionNotice::Expired => {
                "Your session has expired. Please sign in again.".to_string()
            }
            SessionNotice::Unauthorized { message } => {
                format!("You were signed out: {}", message)
            }
        }
    }
}

/// Sink for session notices, injected into the session manager by the UI
/// shell (a toast surface in the web app).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: SessionNotice);
}

/// Fallback notifier that surfaces notices through the log stream.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: SessionNotice) {
        warn!(notice = %notice.message(), "Session notice");
    }
}
