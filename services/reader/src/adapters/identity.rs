//! services/reader/src/adapters/identity.rs
//!
//! A self-hosted identity service implementing the `IdentityService` port.
//!
//! Passwords are hashed with argon2 and kept in a `CredentialStore` (Postgres or
//! in memory). Identity changes are broadcast on a `watch` channel; the channel
//! starts empty and is filled by `restore`, which confirms or denies the
//! credential remembered in the session file.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use clearread_core::{Identity, IdentityService, PortError, PortResult};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;

pub const INVALID_CREDENTIAL: &str = "auth/invalid-credential";
pub const INVALID_EMAIL: &str = "auth/invalid-email";
pub const TOO_MANY_REQUESTS: &str = "auth/too-many-requests";
pub const EMAIL_ALREADY_IN_USE: &str = "auth/email-already-in-use";
pub const WEAK_PASSWORD: &str = "auth/weak-password";
pub const INTERNAL_ERROR: &str = "auth/internal-error";

/// Shortest password the service accepts.
const MIN_PASSWORD_CHARS: usize = 6;

/// Failed sign-ins are counted over this window.
const FAILURE_WINDOW_MINUTES: i64 = 5;

//=========================================================================================
// Credential Storage Port (adapter-internal)
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub uid: String,
    /// Always lower-cased.
    pub email: String,
    pub hashed_password: String,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> PortResult<Option<StoredCredential>>;

    async fn find_by_uid(&self, uid: &str) -> PortResult<Option<StoredCredential>>;

    /// Fails with `PortError::Conflict` if the email is taken.
    async fn insert(&self, credential: &StoredCredential) -> PortResult<()>;
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct LocalIdentityService {
    credentials: Arc<dyn CredentialStore>,
    /// `None` until `restore` has delivered the first verdict.
    state: watch::Sender<Option<Option<Identity>>>,
    failures: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
    max_failed_sign_ins: usize,
    session_file: Option<PathBuf>,
}

impl LocalIdentityService {
    pub fn new(credentials: Arc<dyn CredentialStore>, config: &Config) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            credentials,
            state,
            failures: Mutex::new(HashMap::new()),
            max_failed_sign_ins: config.max_failed_sign_ins,
            session_file: config.session_file.clone(),
        }
    }

    /// Confirms or denies the credential remembered from a previous run and
    /// publishes the result as the first identity notification.
    pub async fn restore(&self) -> Option<Identity> {
        let identity = match self.remembered_uid().await {
            Some(uid) => match self.credentials.find_by_uid(&uid).await {
                Ok(Some(credential)) => Some(Identity {
                    uid: credential.uid,
                    email: credential.email,
                }),
                Ok(None) => {
                    warn!(uid = %uid, "Remembered identity no longer exists.");
                    self.remember(None).await;
                    None
                }
                Err(e) => {
                    error!("Failed to confirm remembered identity: {:?}", e);
                    None
                }
            },
            None => None,
        };
        self.state.send_replace(Some(identity.clone()));
        identity
    }

    fn publish(&self, identity: Option<Identity>) {
        self.state.send_replace(Some(identity));
    }

    async fn remembered_uid(&self) -> Option<String> {
        let path = self.session_file.as_ref()?;
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                let uid = contents.trim().to_string();
                (!uid.is_empty()).then_some(uid)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read session file {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn remember(&self, uid: Option<&str>) {
        let Some(path) = self.session_file.as_ref() else {
            return;
        };
        let result = match uid {
            Some(uid) => tokio::fs::write(path, uid).await,
            None => match tokio::fs::remove_file(path).await {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(e) = result {
            warn!("Failed to update session file {}: {}", path.display(), e);
        }
    }

    fn is_throttled(&self, email: &str) -> bool {
        let Ok(mut failures) = self.failures.lock() else {
            return false;
        };
        let cutoff = Utc::now() - Duration::minutes(FAILURE_WINDOW_MINUTES);
        match failures.get_mut(email) {
            Some(attempts) => {
                attempts.retain(|at| *at > cutoff);
                attempts.len() >= self.max_failed_sign_ins
            }
            None => false,
        }
    }

    /// Records a failed attempt and forgets every email whose attempts have
    /// all left the window.
    fn record_failure(&self, email: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            let now = Utc::now();
            let cutoff = now - Duration::minutes(FAILURE_WINDOW_MINUTES);
            failures.retain(|_, attempts| {
                attempts.retain(|at| *at > cutoff);
                !attempts.is_empty()
            });
            failures.entry(email.to_string()).or_default().push(now);
        }
    }

    fn clear_failures(&self, email: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(email);
        }
    }
}

//=========================================================================================
// `IdentityService` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityService for LocalIdentityService {
    fn identity_changes(&self) -> BoxStream<'static, Option<Identity>> {
        let mut receiver = self.state.subscribe();
        // Deliver the current verdict to late subscribers as well.
        receiver.mark_changed();
        stream::unfold(receiver, |mut receiver| async move {
            loop {
                receiver.changed().await.ok()?;
                let current = receiver.borrow_and_update().clone();
                if let Some(identity) = current {
                    return Some((identity, receiver));
                }
            }
        })
        .boxed()
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<Identity> {
        let email = normalize_email(email)?;

        if self.is_throttled(&email) {
            warn!(email = %email, "Sign-in throttled after repeated failures.");
            return Err(PortError::identity(
                TOO_MANY_REQUESTS,
                "Access to this account has been temporarily disabled due to many failed login attempts.",
            ));
        }

        let credential = self.credentials.find_by_email(&email).await?;
        let verified = match &credential {
            Some(credential) => verify_password(password, &credential.hashed_password)?,
            None => false,
        };
        let credential = match credential {
            Some(credential) if verified => credential,
            _ => {
                self.record_failure(&email);
                return Err(PortError::identity(
                    INVALID_CREDENTIAL,
                    "The supplied email or password is incorrect.",
                ));
            }
        };

        self.clear_failures(&email);
        let identity = Identity {
            uid: credential.uid,
            email: credential.email,
        };
        self.remember(Some(&identity.uid)).await;
        info!(uid = %identity.uid, "Signed in.");
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> PortResult<Identity> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(PortError::identity(
                WEAK_PASSWORD,
                format!("Password should be at least {} characters.", MIN_PASSWORD_CHARS),
            ));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                error!("Failed to hash password: {:?}", e);
                PortError::identity(INTERNAL_ERROR, "Failed to hash password.")
            })?
            .to_string();

        let credential = StoredCredential {
            uid: Uuid::new_v4().to_string(),
            email,
            hashed_password,
        };
        self.credentials
            .insert(&credential)
            .await
            .map_err(|e| match e {
                PortError::Conflict(_) => PortError::identity(
                    EMAIL_ALREADY_IN_USE,
                    "The email address is already in use by another account.",
                ),
                other => other,
            })?;

        let identity = Identity {
            uid: credential.uid,
            email: credential.email,
        };
        self.remember(Some(&identity.uid)).await;
        info!(uid = %identity.uid, "Account created.");
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> PortResult<()> {
        self.remember(None).await;
        info!("Signed out.");
        self.publish(None);
        Ok(())
    }
}

fn normalize_email(email: &str) -> PortResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(PortError::identity(INVALID_EMAIL, "The email address is badly formatted."))
    }
}

fn verify_password(password: &str, hashed_password: &str) -> PortResult<bool> {
    let parsed_hash = PasswordHash::new(hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        PortError::identity(INTERNAL_ERROR, "Authentication error.")
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCredentialStore;

    fn service(max_failed_sign_ins: usize) -> LocalIdentityService {
        let config = Config {
            max_failed_sign_ins,
            ..Config::default()
        };
        LocalIdentityService::new(Arc::new(InMemoryCredentialStore::new()), &config)
    }

    fn code(err: PortError) -> String {
        match err {
            PortError::Identity { code, .. } => code,
            other => panic!("expected an identity error, got {:?}", other),
        }
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
        for bad in ["", "ada", "@example.com", "ada@example", "ada@.com", "a da@example.com"] {
            assert_eq!(code(normalize_email(bad).unwrap_err()), INVALID_EMAIL, "{bad}");
        }
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let identity = service(5);
        let created = identity.sign_up("ada@example.com", "correct horse").await.unwrap();
        let signed_in = identity.sign_in("ADA@example.com", "correct horse").await.unwrap();
        assert_eq!(created, signed_in);
    }

    #[tokio::test]
    async fn duplicate_sign_up_reports_email_in_use() {
        let identity = service(5);
        identity.sign_up("ada@example.com", "correct horse").await.unwrap();
        let err = identity.sign_up("ada@example.com", "another one").await.unwrap_err();
        assert_eq!(code(err), EMAIL_ALREADY_IN_USE);
    }

    #[tokio::test]
    async fn short_passwords_are_weak() {
        let err = service(5).sign_up("ada@example.com", "12345").await.unwrap_err();
        assert_eq!(code(err), WEAK_PASSWORD);
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_the_same() {
        let identity = service(5);
        identity.sign_up("ada@example.com", "correct horse").await.unwrap();
        let wrong = identity.sign_in("ada@example.com", "wrong horse").await.unwrap_err();
        let unknown = identity.sign_in("bob@example.com", "correct horse").await.unwrap_err();
        assert_eq!(code(wrong), INVALID_CREDENTIAL);
        assert_eq!(code(unknown), INVALID_CREDENTIAL);
    }

    #[tokio::test]
    async fn repeated_failures_are_throttled() {
        let identity = service(2);
        identity.sign_up("ada@example.com", "correct horse").await.unwrap();
        for _ in 0..2 {
            identity.sign_in("ada@example.com", "nope!!").await.unwrap_err();
        }
        let err = identity.sign_in("ada@example.com", "correct horse").await.unwrap_err();
        assert_eq!(code(err), TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn expired_failures_are_forgotten() {
        let identity = service(5);
        let long_ago = Utc::now() - Duration::minutes(FAILURE_WINDOW_MINUTES * 2);
        identity
            .failures
            .lock()
            .unwrap()
            .insert("old@example.com".to_string(), vec![long_ago]);

        identity.sign_in("new@example.com", "wrong horse").await.unwrap_err();

        let failures = identity.failures.lock().unwrap();
        assert!(!failures.contains_key("old@example.com"));
        assert_eq!(failures.get("new@example.com").map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn stream_starts_with_restored_verdict() {
        let identity = service(5);
        let mut changes = identity.identity_changes();
        assert_eq!(identity.restore().await, None);
        assert_eq!(changes.next().await, Some(None));

        let signed_up = identity.sign_up("ada@example.com", "correct horse").await.unwrap();
        assert_eq!(changes.next().await, Some(Some(signed_up)));

        identity.sign_out().await.unwrap();
        assert_eq!(changes.next().await, Some(None));
    }
}
