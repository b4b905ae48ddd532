//! services/reader/src/screens/register.rs
//!
//! The sign-up screen. Creates the account, then writes the profile record.

use chrono::Utc;
use clearread_core::{PortResult, UserProfile};
use tracing::{info, warn};

use crate::screens::messages;
use crate::screens::scope::ScreenScope;
use crate::state::AppState;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub display_name: String,
    pub email: String,
    pub password: String,
}

pub struct RegisterScreen {
    state: AppState,
    scope: ScreenScope,
    pub form: RegisterForm,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl RegisterScreen {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            scope: ScreenScope::new(),
            form: RegisterForm::default(),
            error: None,
            success: None,
        }
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    pub async fn submit(&mut self, display_name: &str, email: &str, password: &str) -> bool {
        self.form = RegisterForm {
            display_name: display_name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.trim().to_string(),
        };
        self.error = None;
        self.success = None;

        if let Some(message) = self.validate() {
            self.error = Some(message);
            return false;
        }

        let state = self.state.clone();
        let form = self.form.clone();
        let Some(result) = self.scope.run(create_account(state, form)).await else {
            return false;
        };

        match result {
            Ok(profile) => {
                info!(uid = %profile.uid, "Account created.");
                self.success = Some(messages::SIGNUP_SUCCEEDED.to_string());
                self.form = RegisterForm::default();
                true
            }
            Err(e) => {
                warn!("Signup failed: {}", e);
                self.error = Some(messages::signup_error(&e));
                false
            }
        }
    }

    /// Local checks that run before any network call.
    fn validate(&self) -> Option<String> {
        let min_length = self.state.config.min_password_length;
        if self.form.display_name.is_empty() {
            Some(messages::NAME_REQUIRED.to_string())
        } else if self.form.email.is_empty() {
            Some(messages::EMAIL_REQUIRED.to_string())
        } else if self.form.password.is_empty() {
            Some(messages::PASSWORD_REQUIRED.to_string())
        } else if self.form.password.chars().count() < min_length {
            Some(messages::password_too_short(min_length))
        } else {
            None
        }
    }
}

async fn create_account(state: AppState, form: RegisterForm) -> PortResult<UserProfile> {
    let identity = state.identity.sign_up(&form.email, &form.password).await?;
    let profile = UserProfile {
        uid: identity.uid,
        email: form.email,
        display_name: form.display_name,
        created_at: Utc::now(),
    };
    state.store.put_user_profile(&profile).await?;
    Ok(profile)
}
