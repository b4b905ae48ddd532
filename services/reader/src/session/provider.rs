//! services/reader/src/session/provider.rs
//!
//! The session provider: one subscription to the identity service, one writer,
//! any number of readers.
//!
//! The provider owns the `watch::Sender` inside its background task, so that
//! task is the only thing that ever changes the session. Screens receive a
//! `SessionHandle` through `AppState` and can only read from it.

use clearread_core::{Identity, IdentityService};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long callers wait for the provider to observe an expected change.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// The application's current view of the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Option<Identity>,
    /// True only until the identity service delivers its first verdict.
    pub loading: bool,
}

impl Session {
    pub fn initial() -> Self {
        Self {
            identity: None,
            loading: true,
        }
    }

    pub fn status(&self) -> AuthStatus {
        match (&self.identity, self.loading) {
            (_, true) => AuthStatus::Unknown,
            (Some(identity), false) => AuthStatus::Authorized(identity.clone()),
            (None, false) => AuthStatus::Unauthorized,
        }
    }
}

/// Tri-state view of a session used to gate rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    Unknown,
    Authorized(Identity),
    Unauthorized,
}

impl AuthStatus {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthStatus::Authorized(identity) => Some(identity),
            _ => None,
        }
    }
}

//=========================================================================================
// SessionProvider (Single Writer)
//=========================================================================================

pub struct SessionProvider {
    receiver: watch::Receiver<Session>,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionProvider {
    /// Subscribes to `identity` and starts tracking the session.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(identity: Arc<dyn IdentityService>) -> Self {
        let (sender, receiver) = watch::channel(Session::initial());
        let shutdown = CancellationToken::new();
        let mut changes = identity.identity_changes();

        let token = shutdown.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Session provider unsubscribed.");
                        break;
                    }
                    next = changes.next() => match next {
                        Some(identity) => {
                            match &identity {
                                Some(user) => info!(uid = %user.uid, "Identity confirmed."),
                                None => info!("No signed-in identity."),
                            }
                            sender.send_replace(Session { identity, loading: false });
                        }
                        None => {
                            warn!("Identity stream ended; keeping the last known identity.");
                            // Hold the sender so readers keep seeing the last state.
                            token.cancelled().await;
                            break;
                        }
                    },
                }
            }
        });

        Self {
            receiver,
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            receiver: self.receiver.clone(),
        }
    }

    pub fn current(&self) -> Session {
        self.receiver.borrow().clone()
    }

    /// Unsubscribes from the identity service and waits for the task to stop.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let task = self.task.lock().ok().and_then(|mut guard| guard.take());
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Session provider task ended abnormally: {:?}", e);
            }
        }
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

//=========================================================================================
// SessionHandle (Readers)
//=========================================================================================

/// Read-only access to the session.
#[derive(Clone)]
pub struct SessionHandle {
    receiver: watch::Receiver<Session>,
}

impl SessionHandle {
    pub fn current(&self) -> Session {
        self.receiver.borrow().clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.receiver.borrow().status()
    }

    /// Waits for the first verdict from the identity service.
    ///
    /// Returns `Unknown` only if the provider was torn down before that.
    pub async fn resolved(&mut self) -> AuthStatus {
        let resolved = self
            .receiver
            .wait_for(|session| !session.loading)
            .await
            .map(|session| session.status());
        match resolved {
            Ok(status) => status,
            Err(_) => self.status(),
        }
    }

    /// Waits until `predicate` holds, giving up after [`SETTLE_TIMEOUT`].
    pub async fn wait_for(&mut self, predicate: impl FnMut(&Session) -> bool) -> Option<Session> {
        let wait = async {
            self.receiver
                .wait_for(predicate)
                .await
                .map(|session| session.clone())
        };
        match tokio::time::timeout(SETTLE_TIMEOUT, wait).await {
            Ok(Ok(session)) => Some(session),
            Ok(Err(_)) => None,
            Err(_) => {
                warn!("Timed out waiting for the session to change.");
                None
            }
        }
    }
}
