mod common;

use clearread_core::{IdentityService, PortError};
use common::{local_identity, StuckIdentity};
use reader_lib::adapters::{InMemoryCredentialStore, LocalIdentityService};
use reader_lib::config::Config;
use reader_lib::session::{resolve, resolve_within, AuthStatus, GuardDecision, Route, SessionProvider};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn session_starts_loading_until_the_first_verdict() {
    let identity = local_identity();
    let provider = SessionProvider::start(identity.clone());
    let mut handle = provider.handle();

    assert!(handle.current().loading);
    assert_eq!(handle.status(), AuthStatus::Unknown);

    identity.restore().await;
    assert_eq!(handle.resolved().await, AuthStatus::Unauthorized);
    assert!(!provider.current().loading);
}

#[tokio::test]
async fn late_subscribers_see_the_restored_verdict() {
    let identity = local_identity();
    identity.restore().await;

    let provider = SessionProvider::start(identity.clone());
    let mut handle = provider.handle();
    assert_eq!(handle.resolved().await, AuthStatus::Unauthorized);
}

#[tokio::test]
async fn sign_in_and_out_flow_through_the_provider() {
    let identity = local_identity();
    identity.restore().await;
    let provider = SessionProvider::start(identity.clone());
    let mut handle = provider.handle();
    handle.resolved().await;

    let user = identity.sign_up("Reader@Example.com", "correct horse").await.unwrap();
    assert_eq!(user.email, "reader@example.com");
    let session = handle.wait_for(|s| s.identity.is_some()).await.unwrap();
    assert_eq!(session.status(), AuthStatus::Authorized(user.clone()));

    identity.sign_out().await.unwrap();
    let session = handle.wait_for(|s| s.identity.is_none()).await.unwrap();
    assert_eq!(session.status(), AuthStatus::Unauthorized);

    let again = identity.sign_in("reader@example.com", "correct horse").await.unwrap();
    assert_eq!(again.uid, user.uid);
    handle.wait_for(|s| s.identity.as_ref() == Some(&user)).await.unwrap();
}

#[tokio::test]
async fn every_handle_sees_the_same_session() {
    let identity = local_identity();
    identity.restore().await;
    let provider = SessionProvider::start(identity.clone());
    let mut first = provider.handle();
    let mut second = provider.handle();

    let user = identity.sign_up("reader@example.com", "correct horse").await.unwrap();
    first.wait_for(|s| s.identity.is_some()).await.unwrap();
    second.wait_for(|s| s.identity.is_some()).await.unwrap();
    assert_eq!(first.current(), second.current());
    assert_eq!(first.status().identity(), Some(&user));
}

#[tokio::test]
async fn protected_routes_stay_pending_while_loading() {
    let identity = Arc::new(StuckIdentity::new(PortError::Unexpected("offline".to_string())));
    let provider = SessionProvider::start(identity);
    let mut handle = provider.handle();

    for route in [Route::Dashboard, Route::Document("abc".to_string()), Route::Login] {
        let waited = tokio::time::timeout(Duration::from_millis(50), resolve(&mut handle, &route)).await;
        assert!(waited.is_err(), "{} resolved while the session was unknown", route);
    }

    let (decision, status) = resolve(&mut handle, &Route::Home).await;
    assert_eq!(decision, GuardDecision::Allow);
    assert_eq!(status, AuthStatus::Unknown);
}

#[tokio::test]
async fn bounded_resolution_gives_up_as_pending() {
    let identity = Arc::new(StuckIdentity::new(PortError::Unexpected("offline".to_string())));
    let provider = SessionProvider::start(identity);
    let mut handle = provider.handle();

    let (decision, status) = resolve_within(&mut handle, &Route::Dashboard, Duration::from_millis(20)).await;
    assert_eq!(decision, GuardDecision::Pending);
    assert_eq!(status, AuthStatus::Unknown);
}

#[tokio::test]
async fn resolve_redirects_once_the_session_is_known() {
    let identity = local_identity();
    let provider = SessionProvider::start(identity.clone());
    let mut handle = provider.handle();

    let waiting = tokio::spawn({
        let mut handle = handle.clone();
        async move { resolve(&mut handle, &Route::Dashboard).await }
    });
    identity.restore().await;
    let (decision, _) = waiting.await.unwrap();
    assert_eq!(decision, GuardDecision::Redirect(Route::Login));

    identity.sign_up("reader@example.com", "correct horse").await.unwrap();
    handle.wait_for(|s| s.identity.is_some()).await.unwrap();
    let (decision, status) = resolve(&mut handle, &Route::Login).await;
    assert_eq!(decision, GuardDecision::Redirect(Route::Dashboard));
    assert!(status.identity().is_some());
}

#[tokio::test]
async fn shutdown_keeps_the_last_known_session() {
    let identity = local_identity();
    identity.restore().await;
    let provider = SessionProvider::start(identity.clone());
    let mut handle = provider.handle();
    handle.resolved().await;

    provider.shutdown().await;
    identity.sign_up("reader@example.com", "correct horse").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(handle.status(), AuthStatus::Unauthorized);
}

//=========================================================================================
// Session File
//=========================================================================================

fn remembering(credentials: &Arc<InMemoryCredentialStore>, session_file: &Path) -> Arc<LocalIdentityService> {
    let config = Config {
        session_file: Some(session_file.to_path_buf()),
        ..Config::default()
    };
    Arc::new(LocalIdentityService::new(credentials.clone(), &config))
}

#[tokio::test]
async fn a_remembered_sign_in_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session");
    let credentials = Arc::new(InMemoryCredentialStore::new());

    let first_run = remembering(&credentials, &session_file);
    first_run.restore().await;
    let user = first_run.sign_up("reader@example.com", "correct horse").await.unwrap();
    assert_eq!(std::fs::read_to_string(&session_file).unwrap(), user.uid);

    let second_run = remembering(&credentials, &session_file);
    let provider = SessionProvider::start(second_run.clone());
    let mut handle = provider.handle();
    assert_eq!(second_run.restore().await, Some(user.clone()));
    assert_eq!(handle.resolved().await, AuthStatus::Authorized(user));
}

#[tokio::test]
async fn unknown_remembered_users_are_forgotten() {
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session");
    std::fs::write(&session_file, "no-such-uid").unwrap();

    let identity = remembering(&Arc::new(InMemoryCredentialStore::new()), &session_file);
    let provider = SessionProvider::start(identity.clone());
    let mut handle = provider.handle();
    assert_eq!(identity.restore().await, None);
    assert_eq!(handle.resolved().await, AuthStatus::Unauthorized);
    assert!(!session_file.exists());
}

#[tokio::test]
async fn signing_out_removes_the_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session");
    let identity = remembering(&Arc::new(InMemoryCredentialStore::new()), &session_file);
    identity.restore().await;

    identity.sign_up("reader@example.com", "correct horse").await.unwrap();
    assert!(session_file.exists());
    identity.sign_out().await.unwrap();
    assert!(!session_file.exists());

    // Nothing left to restore.
    let restarted = remembering(&Arc::new(InMemoryCredentialStore::new()), &session_file);
    assert_eq!(restarted.restore().await, None);
}
