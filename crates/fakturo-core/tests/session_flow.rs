//! End-to-end session lifecycle tests against a mock backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fakturo_core::{
    ApiClient, Config, FileSessionStore, Notifier, SessionManager, SessionNotice, SessionStore,
    StoreKey,
};

/// Refresh cadence long enough to never fire within a test.
const IDLE_REFRESH: Duration = Duration::from_secs(600);

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<SessionNotice>>,
}

impl RecordingNotifier {
    fn notices(&self) -> Vec<SessionNotice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: SessionNotice) {
        self.notices.lock().unwrap().push(notice);
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    store: Arc<FileSessionStore>,
    api: Arc<ApiClient>,
    notifier: Arc<RecordingNotifier>,
    sessions: SessionManager,
}

fn harness(uri: &str, refresh_interval: Duration) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileSessionStore::new(dir.path().to_path_buf()).unwrap());
    let config = Config::new(uri, "test-api-key");
    let api = Arc::new(ApiClient::new(&config, store.clone()).unwrap());
    let notifier = Arc::new(RecordingNotifier::default());
    let sessions =
        SessionManager::new(api.clone(), store.clone(), notifier.clone(), refresh_interval);
    Harness { _dir: dir, store, api, notifier, sessions }
}

/// Mint a JWT-shaped token whose payload expires at the given epoch second.
fn token_with_exp(exp: i64) -> String {
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"user-1","exp":{}}}"#, exp))
    )
}

fn token_expiring_in(secs: i64) -> String {
    token_with_exp(chrono::Utc::now().timestamp() + secs)
}

fn session_body(access_token: &str, refresh_token: &str) -> serde_json::Value {
    serde_json::json!({
        "accessToken": access_token,
        "refreshToken": refresh_token,
        "user": { "id": "1", "email": "demo@test.com", "plan": "starter" }
    })
}

async fn mount_login(server: &MockServer, access_token: &str, refresh_token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(header("X-Api-Key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(access_token, refresh_token)))
        .mount(server)
        .await;
}

async fn mount_logout(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

fn assert_store_fully_set(store: &FileSessionStore) {
    assert!(store.get(StoreKey::User).unwrap().is_some());
    assert!(store.get(StoreKey::AccessToken).unwrap().is_some());
    assert!(store.get(StoreKey::RefreshToken).unwrap().is_some());
}

fn assert_store_fully_cleared(store: &FileSessionStore) {
    assert_eq!(store.get(StoreKey::User).unwrap(), None);
    assert_eq!(store.get(StoreKey::AccessToken).unwrap(), None);
    assert_eq!(store.get(StoreKey::RefreshToken).unwrap(), None);
}

#[tokio::test]
async fn login_establishes_session() {
    let server = MockServer::start().await;
    let access = token_expiring_in(3600);
    mount_login(&server, &access, "r1").await;

    let h = harness(&server.uri(), IDLE_REFRESH);
    assert!(!h.sessions.is_authenticated());

    assert!(h.sessions.login("demo@test.com", "x").await);

    assert!(h.sessions.is_authenticated());
    let user = h.sessions.current_user().expect("User should be set after login");
    assert_eq!(user.email, "demo@test.com");
    assert_store_fully_set(&h.store);
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn failed_login_stays_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "bad credentials"})),
        )
        .mount(&server)
        .await;

    let h = harness(&server.uri(), IDLE_REFRESH);
    assert!(!h.sessions.login("demo@test.com", "wrong").await);

    assert!(!h.sessions.is_authenticated());
    assert_store_fully_cleared(&h.store);
}

#[tokio::test]
async fn logout_clears_everything_and_is_idempotent() {
    let server = MockServer::start().await;
    mount_login(&server, &token_expiring_in(3600), "r1").await;
    // The remote call happens once; the second logout holds no credential
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server.uri(), IDLE_REFRESH);
    assert!(h.sessions.login("demo@test.com", "x").await);

    h.sessions.logout().await;
    assert!(!h.sessions.is_authenticated());
    assert_store_fully_cleared(&h.store);

    h.sessions.logout().await;
    assert!(!h.sessions.is_authenticated());
    assert_store_fully_cleared(&h.store);
}

#[tokio::test]
async fn remote_logout_failure_still_clears_locally() {
    let server = MockServer::start().await;
    mount_login(&server, &token_expiring_in(3600), "r1").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "boom"})))
        .mount(&server)
        .await;

    let h = harness(&server.uri(), IDLE_REFRESH);
    assert!(h.sessions.login("demo@test.com", "x").await);

    h.sessions.logout().await;
    assert!(!h.sessions.is_authenticated());
    assert_store_fully_cleared(&h.store);
}

#[tokio::test]
async fn expired_token_forces_logout_with_one_notice() {
    let server = MockServer::start().await;
    mount_login(&server, &token_expiring_in(1), "r1").await;
    mount_logout(&server).await;

    let h = harness(&server.uri(), IDLE_REFRESH);
    assert!(h.sessions.login("demo@test.com", "x").await);
    assert!(h.sessions.is_authenticated());

    tokio::time::sleep(Duration::from_millis(2000)).await;

    assert!(!h.sessions.is_authenticated());
    assert_store_fully_cleared(&h.store);
    assert_eq!(h.notifier.notices(), vec![SessionNotice::Expired]);
}

#[tokio::test]
async fn unauthorized_domain_call_forces_logout() {
    let server = MockServer::start().await;
    mount_login(&server, &token_expiring_in(3600), "r1").await;
    mount_logout(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/invoices"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(serde_json::json!({"error": "token revoked"})),
        )
        .mount(&server)
        .await;

    let h = harness(&server.uri(), IDLE_REFRESH);
    assert!(h.sessions.login("demo@test.com", "x").await);

    let err = h.api.get_invoices(1, 20).await.unwrap_err();
    assert_eq!(err.to_string(), "token revoked");
    assert_eq!(err.status(), Some(403));

    // The forced logout runs on a spawned task
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(!h.sessions.is_authenticated());
    assert_store_fully_cleared(&h.store);
    assert_eq!(
        h.notifier.notices(),
        vec![SessionNotice::Unauthorized { message: "token revoked".to_string() }]
    );
}

#[tokio::test]
async fn rejected_manual_refresh_propagates_without_escalation() {
    let server = MockServer::start().await;
    mount_login(&server, &token_expiring_in(3600), "r1").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "expired"})),
        )
        .mount(&server)
        .await;

    let h = harness(&server.uri(), IDLE_REFRESH);
    assert!(h.sessions.login("demo@test.com", "x").await);

    let err = h.sessions.refresh_auth().await.unwrap_err();
    assert!(err.is_unauthorized());

    tokio::time::sleep(Duration::from_millis(200)).await;

    // Suppression kept the handler out of it; no forced logout happened
    assert!(h.sessions.is_authenticated());
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn scheduled_refresh_rotates_the_session() {
    let server = MockServer::start().await;
    mount_login(&server, &token_expiring_in(3600), "r1").await;
    let rotated = token_expiring_in(3600);
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_partial_json(serde_json::json!({"refreshToken": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(&rotated, "r2")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_partial_json(serde_json::json!({"refreshToken": "r2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(&rotated, "r2")))
        .mount(&server)
        .await;

    let h = harness(&server.uri(), Duration::from_millis(300));
    assert!(h.sessions.login("demo@test.com", "x").await);

    tokio::time::sleep(Duration::from_millis(700)).await;

    assert!(h.sessions.is_authenticated());
    assert_eq!(h.store.get(StoreKey::RefreshToken).unwrap().as_deref(), Some("r2"));
    assert_eq!(h.store.get(StoreKey::AccessToken).unwrap().as_deref(), Some(rotated.as_str()));
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn scheduled_refresh_tolerates_server_errors() {
    let server = MockServer::start().await;
    mount_login(&server, &token_expiring_in(3600), "r1").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(502).set_body_json(serde_json::json!({"error": "bad gateway"})))
        .mount(&server)
        .await;

    let h = harness(&server.uri(), Duration::from_millis(300));
    assert!(h.sessions.login("demo@test.com", "x").await);

    tokio::time::sleep(Duration::from_millis(800)).await;

    // Transient failures never sign the user out
    assert!(h.sessions.is_authenticated());
    assert_store_fully_set(&h.store);
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn scheduled_refresh_rejection_signs_out() {
    let server = MockServer::start().await;
    mount_login(&server, &token_expiring_in(3600), "r1").await;
    mount_logout(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "revoked"})),
        )
        .mount(&server)
        .await;

    let h = harness(&server.uri(), Duration::from_millis(300));
    assert!(h.sessions.login("demo@test.com", "x").await);

    tokio::time::sleep(Duration::from_millis(800)).await;

    assert!(!h.sessions.is_authenticated());
    assert_store_fully_cleared(&h.store);
    assert_eq!(h.notifier.notices(), vec![SessionNotice::Expired]);
}

#[tokio::test]
async fn bootstrap_restores_and_validates_a_persisted_session() {
    let server = MockServer::start().await;
    let persisted = token_expiring_in(3600);
    let rotated = token_expiring_in(3600);
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(header("Authorization", format!("Bearer {}", persisted).as_str()))
        .and(body_partial_json(serde_json::json!({"refreshToken": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(&rotated, "r2")))
        .mount(&server)
        .await;

    let h = harness(&server.uri(), IDLE_REFRESH);
    h.store
        .put(StoreKey::User, r#"{"id":"1","email":"demo@test.com","plan":"starter"}"#)
        .unwrap();
    h.store.put(StoreKey::AccessToken, &persisted).unwrap();
    h.store.put(StoreKey::RefreshToken, "r1").unwrap();

    h.sessions.bootstrap().await;

    assert!(h.sessions.is_authenticated());
    assert_eq!(h.sessions.current_user().unwrap().email, "demo@test.com");
    assert_eq!(h.store.get(StoreKey::RefreshToken).unwrap().as_deref(), Some("r2"));
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn bootstrap_with_rejected_refresh_signs_out() {
    let server = MockServer::start().await;
    mount_logout(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "revoked"})),
        )
        .mount(&server)
        .await;

    let h = harness(&server.uri(), IDLE_REFRESH);
    h.store.put(StoreKey::User, r#"{"id":"1","email":"demo@test.com"}"#).unwrap();
    h.store.put(StoreKey::AccessToken, &token_expiring_in(3600)).unwrap();
    h.store.put(StoreKey::RefreshToken, "r1").unwrap();

    h.sessions.bootstrap().await;

    assert!(!h.sessions.is_authenticated());
    assert_store_fully_cleared(&h.store);
    assert_eq!(h.notifier.notices(), vec![SessionNotice::Expired]);
}

#[tokio::test]
async fn bootstrap_without_persisted_session_does_nothing() {
    let server = MockServer::start().await;
    let h = harness(&server.uri(), IDLE_REFRESH);

    h.sessions.bootstrap().await;

    assert!(!h.sessions.is_authenticated());
    assert_store_fully_cleared(&h.store);
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn concurrent_refresh_and_logout_leave_consistent_state() {
    let server = MockServer::start().await;
    mount_login(&server, &token_expiring_in(3600), "r1").await;
    mount_logout(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_body(&token_expiring_in(3600), "r2"))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let h = harness(&server.uri(), IDLE_REFRESH);
    assert!(h.sessions.login("demo@test.com", "x").await);

    let (refresh_result, ()) = tokio::join!(h.sessions.refresh_auth(), h.sessions.logout());
    let _ = refresh_result;

    // Whichever write landed last, the session is all-or-nothing
    let user = h.store.get(StoreKey::User).unwrap();
    let access = h.store.get(StoreKey::AccessToken).unwrap();
    let refresh = h.store.get(StoreKey::RefreshToken).unwrap();
    assert_eq!(user.is_some(), access.is_some());
    assert_eq!(access.is_some(), refresh.is_some());
    assert_eq!(h.sessions.is_authenticated(), refresh.is_some());
}
