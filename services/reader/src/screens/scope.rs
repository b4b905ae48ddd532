//! services/reader/src/screens/scope.rs
//!
//! Every mounted screen owns a `ScreenScope`. Async work started by the screen
//! runs through `ScreenScope::run`, and its result is only handed back while the
//! screen is still mounted.

use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct ScreenScope {
    token: CancellationToken,
}

impl ScreenScope {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// A token that disposes this scope when cancelled.
    pub fn dispose_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn dispose(&self) {
        self.token.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Runs `work` unless the scope is disposed first.
    ///
    /// Returns `None` when the scope was disposed before or while `work` ran; the
    /// caller must then leave its state untouched.
    pub async fn run<F: Future>(&self, work: F) -> Option<F::Output> {
        if self.is_disposed() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                debug!("Screen disposed; dropping pending work.");
                None
            }
            output = work => (!self.is_disposed()).then_some(output),
        }
    }
}

impl Default for ScreenScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScreenScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
