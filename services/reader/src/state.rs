//! services/reader/src/state.rs
//!
//! Defines the application state shared by every screen.

use crate::config::Config;
use crate::session::SessionHandle;
use clearread_core::ports::{ConversionService, DocumentStore, IdentityService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to every screen.
///
/// Screens get the session from here instead of looking it up globally, and can
/// only read it.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityService>,
    pub store: Arc<dyn DocumentStore>,
    pub conversion: Arc<dyn ConversionService>,
    pub session: SessionHandle,
    pub config: Arc<Config>,
}
