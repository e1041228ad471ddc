//! REST API client module for the Fakturo backend.
//!
//! This module provides the `ApiClient`, the single component that issues
//! network calls: it attaches the bearer credential and static API key to
//! every request, normalizes error responses into `ApiError`, and escalates
//! 401/403 responses to the session manager's registered handler.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
