//! Session lifecycle orchestration.
//!
//! `SessionManager` owns the authenticated user record and is the only
//! component that moves credentials in response to domain events: it drives
//! login, registration, logout, and silent refresh through the API client,
//! persists the resulting session, and schedules proactive expiry handling.
//!
//! Construct it once at application start and pass it down by reference;
//! there is no ambient singleton.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{AuthSession, User};

use super::claims;
use super::notify::{Notifier, SessionNotice};
use super::store::{SessionStore, StoreKey};

/// Mutable session state guarded by one lock so every transition replaces
/// the user and scheduled work together. Late responses overwrite wholesale;
/// the state is always fully set or fully cleared, never mixed.
#[derive(Default)]
struct SessionState {
    user: Option<User>,
    expiry_timer: Option<JoinHandle<()>>,
    refresh_task: Option<JoinHandle<()>>,
}

struct SessionInner {
    api: Arc<ApiClient>,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    refresh_interval: Duration,
    state: Mutex<SessionState>,
}

/// Owns the session lifecycle. See the module docs.
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    /// Create the session manager and register its unauthorized handler on
    /// the API client. The handler forces a logout with an "unauthorized"
    /// notice whenever any domain call is rejected with 401/403.
    pub fn new(
        api: Arc<ApiClient>,
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
        refresh_interval: Duration,
    ) -> Self {
        let inner = Arc::new(SessionInner {
            api,
            store,
            notifier,
            refresh_interval,
            state: Mutex::new(SessionState::default()),
        });

        let weak = Arc::downgrade(&inner);
        inner.api.set_unauthorized_handler(Some(Box::new(move |message: &str| {
            let Some(inner) = weak.upgrade() else { return };
            let message = message.to_string();
            tokio::spawn(async move {
                force_logout(&inner, SessionNotice::Unauthorized { message }).await;
            });
        })));

        Self { inner }
    }

    /// Whether a user is signed in. A session without a durable refresh
    /// token is not a session, whatever the in-memory state says.
    pub fn is_authenticated(&self) -> bool {
        let has_user = self.inner.state.lock().unwrap().user.is_some();
        has_user && matches!(self.inner.store.get(StoreKey::RefreshToken), Ok(Some(_)))
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.inner.state.lock().unwrap().user.clone()
    }

    /// Sign in with email and password. Returns `true` on success. Failures
    /// are logged and reported as `false` so the calling page can show a
    /// generic retry message without inspecting the error.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        match self.inner.api.login(email, password).await {
            Ok(session) => {
                apply_session(&self.inner, session);
                true
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                false
            }
        }
    }

    /// Create an account and sign in. Same result contract as [`login`].
    ///
    /// [`login`]: SessionManager::login
    pub async fn register(&self, email: &str, password: &str, company_name: Option<&str>) -> bool {
        match self.inner.api.register(email, password, company_name).await {
            Ok(session) => {
                apply_session(&self.inner, session);
                true
            }
            Err(e) => {
                error!(error = %e, "Registration failed");
                false
            }
        }
    }

    /// Exchange the stored refresh token for a fresh session. Errors
    /// propagate to the caller; the scheduled refresh applies its own
    /// forced-logout policy on top of this.
    pub async fn refresh_auth(&self) -> Result<(), ApiError> {
        refresh_session(&self.inner).await
    }

    /// Sign out: best-effort remote invalidation, then unconditional local
    /// cleanup. Safe to call repeatedly; logging out while anonymous does
    /// nothing and never fails.
    pub async fn logout(&self) {
        logout(&self.inner).await;
    }

    /// Restore a persisted session at application start. Hydrates the user
    /// record and access token from the durable store, arms the expiry
    /// timer, starts the scheduled refresh, and immediately attempts one
    /// refresh to validate the session before the user touches anything.
    pub async fn bootstrap(&self) {
        let inner = &self.inner;

        match inner.store.get(StoreKey::RefreshToken) {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!("No persisted session to restore");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted refresh token");
                return;
            }
        }

        let user = match inner.store.get(StoreKey::User) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => user,
                Err(e) => {
                    warn!(error = %e, "Persisted user record is invalid");
                    return;
                }
            },
            Ok(None) => {
                debug!("Persisted refresh token has no user record; ignoring");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted user record");
                return;
            }
        };

        {
            let mut state = inner.state.lock().unwrap();
            state.user = Some(user);
            if let Some(token) = inner.api.access_token() {
                arm_expiry_timer(inner, &mut state, &token);
            }
            ensure_refresh_task(inner, &mut state);
        }
        debug!("Restored persisted session; validating with a refresh");

        match refresh_session(inner).await {
            Ok(()) => {}
            Err(e) if e.is_unauthorized() => {
                force_logout(inner, SessionNotice::Expired).await;
            }
            Err(e) => {
                warn!(error = %e, "Startup session refresh failed; keeping persisted session");
            }
        }
    }

    /// Cancel scheduled work and unregister the unauthorized handler. Runs
    /// automatically on drop.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock().unwrap();
        if let Some(handle) = state.expiry_timer.take() {
            handle.abort();
        }
        if let Some(handle) = state.refresh_task.take() {
            handle.abort();
        }
        drop(state);
        self.inner.api.set_unauthorized_handler(None);
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Persist and adopt a fresh session wholesale: durable user and refresh
/// token, access token through the gateway mirror, expiry timer re-armed,
/// scheduled refresh running.
fn apply_session(inner: &Arc<SessionInner>, session: AuthSession) {
    match serde_json::to_string(&session.user) {
        Ok(serialized) => {
            if let Err(e) = inner.store.put(StoreKey::User, &serialized) {
                warn!(error = %e, "Failed to persist user record");
            }
        }
        Err(e) => warn!(error = %e, "Failed to serialize user record"),
    }
    if let Err(e) = inner.store.put(StoreKey::RefreshToken, &session.refresh_token) {
        warn!(error = %e, "Failed to persist refresh token");
    }
    inner.api.set_access_token(Some(&session.access_token));

    let mut state = inner.state.lock().unwrap();
    state.user = Some(session.user);
    arm_expiry_timer(inner, &mut state, &session.access_token);
    ensure_refresh_task(inner, &mut state);
}

/// Arm the single expiry timer from the token's `exp` claim, cancelling any
/// prior timer. Tokens without a decodable expiry arm nothing; a 401 will
/// catch the expiry reactively instead.
fn arm_expiry_timer(inner: &Arc<SessionInner>, state: &mut SessionState, access_token: &str) {
    if let Some(handle) = state.expiry_timer.take() {
        handle.abort();
    }

    let Some(expires_at) = claims::token_expiry(access_token) else {
        debug!("Access token carries no decodable expiry");
        return;
    };

    // An already-expired persisted token fires immediately
    let delay = (expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    debug!(?delay, "Arming session expiry timer");

    let weak = Arc::downgrade(inner);
    state.expiry_timer = Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let Some(inner) = weak.upgrade() else { return };
        debug!("Access token reached its expiry");
        force_logout(&inner, SessionNotice::Expired).await;
    }));
}

/// Start the scheduled silent refresh if it is not already running.
/// Transient failures keep the session; a rejected refresh ends it.
fn ensure_refresh_task(inner: &Arc<SessionInner>, state: &mut SessionState) {
    if state.refresh_task.is_some() {
        return;
    }

    let interval = inner.refresh_interval;
    let weak = Arc::downgrade(inner);
    state.refresh_task = Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the login/restore that
        // started this task just produced a fresh session.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else { return };
            match refresh_session(&inner).await {
                Ok(()) => {}
                Err(e) if e.is_unauthorized() => {
                    debug!(error = %e, "Scheduled refresh was rejected");
                    force_logout(&inner, SessionNotice::Expired).await;
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "Scheduled session refresh failed; will retry");
                }
            }
        }
    }));
}

async fn refresh_session(inner: &Arc<SessionInner>) -> Result<(), ApiError> {
    let refresh_token = match inner.store.get(StoreKey::RefreshToken) {
        Ok(Some(token)) => token,
        Ok(None) => return Err(ApiError::MissingSession),
        Err(e) => {
            warn!(error = %e, "Failed to read refresh token");
            return Err(ApiError::MissingSession);
        }
    };

    let session = inner.api.refresh(&refresh_token).await?;
    apply_session(inner, session);
    Ok(())
}

async fn force_logout(inner: &Arc<SessionInner>, notice: SessionNotice) {
    inner.notifier.notify(notice);
    logout(inner).await;
}

async fn logout(inner: &Arc<SessionInner>) {
    // Remote invalidation is best-effort and must never block local cleanup.
    // Skipped entirely when no credential is held.
    if inner.api.access_token().is_some() {
        if let Err(e) = inner.api.logout().await {
            warn!(error = %e, "Remote logout failed");
        }
    }
    clear_local(inner);
}

fn clear_local(inner: &Arc<SessionInner>) {
    let mut state = inner.state.lock().unwrap();
    if let Some(handle) = state.expiry_timer.take() {
        handle.abort();
    }
    if let Some(handle) = state.refresh_task.take() {
        handle.abort();
    }
    state.user = None;
    drop(state);

    inner.api.set_access_token(None);
    for key in [StoreKey::User, StoreKey::RefreshToken] {
        if let Err(e) = inner.store.remove(key) {
            warn!(key = ?key, error = %e, "Failed to clear session key");
        }
    }
}
