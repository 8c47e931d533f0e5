//! End-to-end runtime tests against mocked identity and backend HTTP endpoints.

use std::path::Path;
use std::time::Duration;

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use tempfile::TempDir;

use pp_core::config::AppConfig;
use pp_core::{IdentitySnapshot, NavigationState, PendingWelcome, Route, SessionState};
use pp_runtime::{build_runtime, AppRuntime};

const PROFILE_BODY: &str = r#"{
    "id": "p-1",
    "firstName": "Ayşe",
    "lastName": "Demir",
    "email": "ayse@example.com",
    "verify": true,
    "isActive": true
}"#;

fn seed_store(dir: &Path, entries: serde_json::Value) {
    std::fs::write(dir.join("store.json"), entries.to_string()).unwrap();
}

fn stored_session() -> String {
    json!({
        "uid": "uid-1",
        "email": "ayse@example.com",
        "displayName": "Ayşe Demir",
        "refreshToken": "refresh-1"
    })
    .to_string()
}

fn config(server: &ServerGuard, data_dir: &Path) -> AppConfig {
    let mut config = AppConfig::with_system_defaults(data_dir.to_path_buf());
    config.backend_base_url = server.url();
    config.request_timeout_ms = 2_000;
    config.identity_api_key = "test-key".to_string();
    config.identity_auth_base_url = server.url();
    config.identity_token_base_url = server.url();
    config
}

async fn mock_token(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", Matcher::Regex("^/token".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id_token":"id-token-1","refresh_token":"refresh-1"}"#)
        .expect_at_least(1)
        .create_async()
        .await
}

async fn mock_verify(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/auth/verify")
        .match_body(Matcher::PartialJson(json!({ "idToken": "id-token-1" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PROFILE_BODY)
        .expect_at_least(1)
        .create_async()
        .await
}

async fn route(runtime: &AppRuntime, expected: Route) -> NavigationState {
    let mut rx = runtime.subscribe_navigation();
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.as_ref().map(|s| &s.route) == Some(&expected)),
    )
    .await
    .unwrap_or_else(|_| panic!("route {expected:?} not reached"))
    .unwrap()
    .clone();
    state.unwrap()
}

async fn settled(runtime: &AppRuntime, expected: SessionState) {
    let mut rx = runtime.session().subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.state == expected))
        .await
        .unwrap_or_else(|_| panic!("session never reached {expected:?}"))
        .unwrap();
}

fn read_store(dir: &Path) -> serde_json::Value {
    let raw = std::fs::read_to_string(dir.join("store.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn restored_session_reaches_main_with_fresh_profile() {
    let mut server = Server::new_async().await;
    let token = mock_token(&mut server).await;
    let verify = mock_verify(&mut server).await;

    let dir = TempDir::new().unwrap();
    seed_store(
        dir.path(),
        json!({ "onboarding_completed": "true", "identitySession": stored_session() }),
    );

    let runtime = build_runtime(&config(&server, dir.path())).unwrap();
    let snapshot = runtime.init().await;
    assert!(matches!(snapshot, IdentitySnapshot::SignedIn(_)));

    route(&runtime, Route::Main).await;
    settled(&runtime, SessionState::Ready).await;

    let profile = runtime.session().profile().unwrap();
    assert_eq!(profile.first_name.as_deref(), Some("Ayşe"));
    assert_eq!(read_store(dir.path())["authToken"], "id-token-1");

    token.assert_async().await;
    verify.assert_async().await;
    runtime.dispose().await;
}

#[tokio::test]
async fn restored_session_with_unreachable_backend_degrades_to_main() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server).await;
    let _verify = server
        .mock("POST", "/auth/verify")
        .with_status(503)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    seed_store(
        dir.path(),
        json!({ "onboarding_completed": "true", "identitySession": stored_session() }),
    );

    let runtime = build_runtime(&config(&server, dir.path())).unwrap();
    runtime.init().await;

    settled(&runtime, SessionState::Degraded).await;
    route(&runtime, Route::Main).await;
    assert!(runtime.session().profile().is_none());

    runtime.dispose().await;
}

#[tokio::test]
async fn revoked_refresh_token_returns_to_auth() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", Matcher::Regex("^/token".to_string()))
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"code":400,"message":"TOKEN_EXPIRED"}}"#)
        .create_async()
        .await;
    let verify = server
        .mock("POST", "/auth/verify")
        .expect(0)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    seed_store(
        dir.path(),
        json!({
            "onboarding_completed": "true",
            "identitySession": stored_session(),
            "authToken": "stale-token"
        }),
    );

    let runtime = build_runtime(&config(&server, dir.path())).unwrap();
    runtime.init().await;

    route(&runtime, Route::Auth).await;
    settled(&runtime, SessionState::Unauthenticated).await;
    assert!(runtime.session().snapshot().identity.is_none());

    let store = read_store(dir.path());
    assert!(store.get("authToken").is_none());
    assert!(store.get("identitySession").is_none());

    verify.assert_async().await;
    runtime.dispose().await;
}

#[tokio::test]
async fn first_run_shows_onboarding_then_auth() {
    let server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let runtime = build_runtime(&config(&server, dir.path())).unwrap();
    let snapshot = runtime.init().await;
    assert_eq!(snapshot, IdentitySnapshot::SignedOut);

    route(&runtime, Route::Onboarding).await;
    settled(&runtime, SessionState::Unauthenticated).await;

    runtime.complete_onboarding().execute().await.unwrap();

    let state = route(&runtime, Route::Auth).await;
    assert_eq!(state.stack.len(), 1);
    assert_eq!(read_store(dir.path())["onboarding_completed"], "true");

    runtime.dispose().await;
}

#[tokio::test]
async fn password_login_shows_welcome_and_survives_restart() {
    let mut server = Server::new_async().await;
    let _sign_in = server
        .mock("POST", Matcher::Regex("^/accounts:signInWithPassword".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "localId": "uid-1",
                "email": "ayse@example.com",
                "displayName": "Ayşe Demir",
                "refreshToken": "refresh-1"
            })
            .to_string(),
        )
        .create_async()
        .await;
    let _token = mock_token(&mut server).await;
    let _verify = mock_verify(&mut server).await;

    let dir = TempDir::new().unwrap();
    seed_store(dir.path(), json!({ "onboarding_completed": "true" }));

    let runtime = build_runtime(&config(&server, dir.path())).unwrap();
    runtime.init().await;
    route(&runtime, Route::Auth).await;

    let snapshot = runtime
        .session()
        .login("ayse@example.com", "hunter2")
        .await
        .unwrap();
    assert_eq!(snapshot.state, SessionState::Ready);

    let welcome = PendingWelcome::returning_user(Some("Ayşe Demir".to_string()));
    route(&runtime, Route::Welcome(welcome)).await;
    runtime.navigation().dismiss_welcome();
    route(&runtime, Route::Main).await;
    runtime.dispose().await;

    // Same data dir, new process: the provider session is restored from disk.
    let restarted = build_runtime(&config(&server, dir.path())).unwrap();
    let restored = restarted.init().await;
    assert!(matches!(restored, IdentitySnapshot::SignedIn(ref id) if id.id.as_str() == "uid-1"));
    route(&restarted, Route::Main).await;
    restarted.dispose().await;
}

#[tokio::test]
async fn rejected_credentials_keep_auth_route() {
    let mut server = Server::new_async().await;
    let _sign_in = server
        .mock("POST", Matcher::Regex("^/accounts:signInWithPassword".to_string()))
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"code":400,"message":"INVALID_LOGIN_CREDENTIALS"}}"#)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    seed_store(dir.path(), json!({ "onboarding_completed": "true" }));

    let runtime = build_runtime(&config(&server, dir.path())).unwrap();
    runtime.init().await;
    route(&runtime, Route::Auth).await;

    let err = runtime
        .session()
        .login("ayse@example.com", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), pp_core::AuthErrorKind::InvalidCredential);
    assert_eq!(runtime.session().state(), SessionState::Unauthenticated);
    assert_eq!(
        runtime.navigation().current().map(|s| s.route),
        Some(Route::Auth)
    );

    runtime.dispose().await;
}

#[tokio::test]
async fn init_is_idempotent() {
    let server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let runtime = build_runtime(&config(&server, dir.path())).unwrap();
    let first = runtime.init().await;
    let second = runtime.init().await;

    assert_eq!(first, second);
    runtime.dispose().await;
}

#[tokio::test]
async fn subscriber_registered_before_init_sees_first_route() {
    let server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let runtime = build_runtime(&config(&server, dir.path())).unwrap();
    let mut routes = runtime.subscribe_navigation();
    assert!(routes.borrow_and_update().is_none());

    runtime.init().await;

    tokio::time::timeout(Duration::from_secs(5), routes.changed())
        .await
        .expect("first route never announced")
        .unwrap();
    let first = routes.borrow_and_update().clone();
    assert_eq!(first.map(|s| s.route), Some(Route::Onboarding));
    runtime.dispose().await;
}
