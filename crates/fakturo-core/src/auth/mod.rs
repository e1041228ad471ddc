//! Authentication module for managing the session lifecycle.
//!
//! This module provides:
//! - `SessionManager`: login/logout/refresh orchestration with proactive
//!   token-expiry scheduling and periodic silent refresh
//! - `SessionStore`: durable persistence for the token pair and user record
//! - `Notifier`: user-facing notices for forced sign-outs
//!
//! Sessions survive restarts through the durable store and are validated
//! with a refresh at startup.

mod claims;
pub mod notify;
pub mod session;
pub mod store;

pub use notify::{LogNotifier, Notifier, SessionNotice};
pub use session::SessionManager;
pub use store::{FileSessionStore, SessionStore, StoreKey};
