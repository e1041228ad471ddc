//! Fakturo core - session management and API client for the Fakturo
//! invoicing application.
//!
//! The UI shell constructs a [`Config`], a store, an [`ApiClient`], and a
//! [`SessionManager`] once at startup and passes them down by reference.
//! Pages call the client's typed operations directly for domain work
//! (invoices, expenses, summaries, billing); the session manager owns
//! credential persistence, proactive token-expiry handling, and silent
//! refresh, and reports authentication state.
//!
//! ```no_run
//! use std::sync::Arc;
//! use fakturo_core::{ApiClient, Config, FileSessionStore, LogNotifier, SessionManager};
//!
//! # async fn start() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let store = Arc::new(FileSessionStore::new(config.data_dir()?)?);
//! let api = Arc::new(ApiClient::new(&config, store.clone())?);
//! let sessions = SessionManager::new(
//!     api.clone(),
//!     store,
//!     Arc::new(LogNotifier),
//!     config.refresh_interval,
//! );
//! sessions.bootstrap().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{
    FileSessionStore, LogNotifier, Notifier, SessionManager, SessionNotice, SessionStore, StoreKey,
};
pub use config::Config;
