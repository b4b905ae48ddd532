//! services/reader/src/screens/login.rs
//!
//! The login screen.

use tracing::{info, warn};

use crate::screens::messages;
use crate::screens::scope::ScreenScope;
use crate::state::AppState;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub struct LoginScreen {
    state: AppState,
    scope: ScreenScope,
    pub form: LoginForm,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl LoginScreen {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            scope: ScreenScope::new(),
            form: LoginForm::default(),
            error: None,
            success: None,
        }
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    /// Signs in with the given credentials.
    ///
    /// Returns true on success; the session provider picks the new identity up
    /// from the identity service on its own.
    pub async fn submit(&mut self, email: &str, password: &str) -> bool {
        self.form = LoginForm {
            email: email.trim().to_string(),
            password: password.trim().to_string(),
        };
        self.error = None;
        self.success = None;

        if self.form.email.is_empty() {
            self.error = Some(messages::EMAIL_REQUIRED.to_string());
            return false;
        }
        if self.form.password.is_empty() {
            self.error = Some(messages::PASSWORD_REQUIRED.to_string());
            return false;
        }

        let identity = self.state.identity.clone();
        let (email, password) = (self.form.email.clone(), self.form.password.clone());
        let Some(result) = self
            .scope
            .run(async move { identity.sign_in(&email, &password).await })
            .await
        else {
            return false;
        };

        match result {
            Ok(identity) => {
                info!(uid = %identity.uid, "Login succeeded.");
                self.success = Some(messages::LOGIN_SUCCEEDED.to_string());
                self.form = LoginForm::default();
                true
            }
            Err(e) => {
                warn!("Login failed: {}", e);
                self.error = Some(messages::login_error(&e));
                false
            }
        }
    }
}
