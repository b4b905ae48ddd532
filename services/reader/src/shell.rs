//! services/reader/src/shell.rs
//!
//! The navigator. Owns the current route and the mounted screen, runs every
//! navigation through the route guard and feeds commands to the screen that
//! handles them.

use tracing::{debug, info, warn};

use crate::command::{Command, HELP};
use crate::screens::{DashboardScreen, DocumentScreen, LoginScreen, RegisterScreen};
use crate::session::guard::{self, GuardDecision, Route};
use crate::session::provider::{AuthStatus, SessionHandle};
use crate::state::AppState;

/// Redirect hops followed before giving up on a navigation.
pub const MAX_REDIRECTS: usize = 4;

pub const OPEN_DOCUMENT_FIRST: &str = "Open a document first.";
pub const OPEN_DASHBOARD_FIRST: &str = "Go to the dashboard first.";
pub const ALREADY_SIGNED_IN: &str = "You are already signed in.";
pub const NOT_SIGNED_IN: &str = "You are not signed in.";

/// The mounted screen. Replacing it drops the old screen, which disposes its
/// scope and abandons whatever it was still waiting for.
pub enum Screen {
    Loading,
    Home,
    Login(LoginScreen),
    Register(RegisterScreen),
    Dashboard(DashboardScreen),
    Document(Box<DocumentScreen>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    state: AppState,
    session: SessionHandle,
    route: Route,
    screen: Screen,
    notice: Option<String>,
}

impl Shell {
    pub fn new(state: AppState) -> Self {
        let session = state.session.clone();
        Self {
            state,
            session,
            route: Route::Home,
            screen: Screen::Loading,
            notice: None,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    /// One-off message from the shell itself (help text, parse errors).
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    /// Disposes the current screen, resolves the guard for `route` and mounts
    /// whatever the guard allows.
    pub async fn navigate(&mut self, route: Route) {
        self.screen = Screen::Loading;
        let mut target = route;

        for _ in 0..=MAX_REDIRECTS {
            let timeout = self.state.config.session_timeout;
            let (decision, status) = guard::resolve_within(&mut self.session, &target, timeout).await;
            match decision {
                GuardDecision::Pending => {
                    debug!(route = %target, "Session unknown; holding on the loading screen.");
                    self.route = target;
                    return;
                }
                GuardDecision::Redirect(next) => {
                    debug!(from = %target, to = %next, "Redirecting.");
                    target = next;
                }
                GuardDecision::Allow => {
                    self.route = target.clone();
                    self.screen = self.mount(&target, &status).await;
                    return;
                }
            }
        }
        warn!(route = %target, "Too many redirects; staying on the loading screen.");
        self.route = target;
    }

    /// Re-runs the guard for the current route.
    pub async fn refresh(&mut self) {
        let route = self.route.clone();
        self.navigate(route).await;
    }

    async fn mount(&self, route: &Route, status: &AuthStatus) -> Screen {
        let identity = status.identity().cloned();
        match (route, identity) {
            (Route::Home, _) => Screen::Home,
            (Route::Login, _) => Screen::Login(LoginScreen::new(self.state.clone())),
            (Route::Register, _) => Screen::Register(RegisterScreen::new(self.state.clone())),
            (Route::Dashboard, Some(identity)) => {
                Screen::Dashboard(DashboardScreen::mount(self.state.clone(), identity).await)
            }
            (Route::Document(id), Some(identity)) => Screen::Document(Box::new(
                DocumentScreen::mount(self.state.clone(), identity, id).await,
            )),
            (_, None) => Screen::Loading,
        }
    }

    pub async fn apply(&mut self, command: Command) -> Flow {
        self.notice = None;
        match command {
            Command::Quit => return Flow::Quit,
            Command::Help => self.notice = Some(HELP.to_string()),
            // A screen held on loading gets another chance at the guard.
            Command::Show if matches!(self.screen, Screen::Loading) => self.refresh().await,
            Command::Show => {}
            Command::Go(route) => self.navigate(route).await,
            Command::Open(id) => self.navigate(Route::Document(id)).await,
            Command::Login { email, password } => self.login(&email, &password).await,
            Command::Register {
                display_name,
                email,
                password,
            } => self.register(&display_name, &email, &password).await,
            Command::Logout => self.logout().await,
            Command::New => match &mut self.screen {
                Screen::Dashboard(dashboard) => dashboard.create_document().await,
                _ => self.notice = Some(OPEN_DASHBOARD_FIRST.to_string()),
            },
            other => self.apply_to_document(other).await,
        }
        Flow::Continue
    }

    async fn login(&mut self, email: &str, password: &str) {
        if !matches!(self.screen, Screen::Login(_)) {
            self.navigate(Route::Login).await;
        }
        let Screen::Login(screen) = &mut self.screen else {
            self.notice = Some(ALREADY_SIGNED_IN.to_string());
            return;
        };
        if screen.submit(email, password).await {
            let success = screen.success.clone();
            self.settle(true).await;
            self.notice = success;
        }
    }

    async fn register(&mut self, display_name: &str, email: &str, password: &str) {
        if !matches!(self.screen, Screen::Register(_)) {
            self.navigate(Route::Register).await;
        }
        let Screen::Register(screen) = &mut self.screen else {
            self.notice = Some(ALREADY_SIGNED_IN.to_string());
            return;
        };
        if screen.submit(display_name, email, password).await {
            let success = screen.success.clone();
            self.settle(true).await;
            self.notice = success;
        }
    }

    async fn logout(&mut self) {
        let signed_out = match &mut self.screen {
            Screen::Dashboard(dashboard) => dashboard.logout().await,
            _ if self.session.current().identity.is_none() => {
                self.notice = Some(NOT_SIGNED_IN.to_string());
                return;
            }
            _ => match self.state.identity.sign_out().await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Logout failed: {}", e);
                    false
                }
            },
        };
        if signed_out {
            info!("Signed out.");
            self.settle(false).await;
        }
    }

    /// Waits for the provider to reflect a sign-in (`true`) or sign-out, then
    /// lets the guard move the user along.
    async fn settle(&mut self, signed_in: bool) {
        self.session
            .wait_for(|session| !session.loading && session.identity.is_some() == signed_in)
            .await;
        self.refresh().await;
    }

    async fn apply_to_document(&mut self, command: Command) {
        let Screen::Document(screen) = &mut self.screen else {
            self.notice = Some(OPEN_DOCUMENT_FIRST.to_string());
            return;
        };
        let screen = screen.as_mut();
        if !screen.is_loaded() {
            self.notice = Some(OPEN_DOCUMENT_FIRST.to_string());
            return;
        }
        match command {
            Command::Edit(text) => screen.set_original_text(text),
            Command::Save => {
                screen.save_original().await;
            }
            Command::Convert => {
                screen.convert().await;
            }
            Command::Rename(name) => {
                screen.rename_to(&name).await;
            }
            Command::Font(family) => screen.typography.set_font_family(family),
            Command::Size(px) => screen.typography.set_font_size(px),
            Command::Spacing(em) => screen.typography.set_letter_spacing(em),
            Command::LineHeight(ratio) => screen.typography.set_line_height(ratio),
            Command::Color(color) => {
                if let Err(e) = screen.typography.set_text_color(&color) {
                    self.notice = Some(e.to_string());
                }
            }
            Command::Background(color) => {
                if let Err(e) = screen.typography.set_background_color(&color) {
                    self.notice = Some(e.to_string());
                }
            }
            _ => {}
        }
    }
}
