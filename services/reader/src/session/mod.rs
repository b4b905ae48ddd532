pub mod guard;
pub mod provider;

pub use guard::{decide, resolve, resolve_within, GuardDecision, Route, ScreenGroup};
pub use provider::{AuthStatus, Session, SessionHandle, SessionProvider};
