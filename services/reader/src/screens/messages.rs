//! services/reader/src/screens/messages.rs
//!
//! Turns errors into the strings the screens display. Nothing past a screen
//! ever sees an error value; everything ends up here.

use clearread_core::PortError;

use crate::access::AccessError;
use crate::adapters::identity::{
    EMAIL_ALREADY_IN_USE, INVALID_CREDENTIAL, INVALID_EMAIL, TOO_MANY_REQUESTS, WEAK_PASSWORD,
};

pub const LOGIN_FAILED: &str = "An error occurred during login.";
pub const SIGNUP_FAILED: &str = "An error occurred during signup.";
pub const LOGIN_SUCCEEDED: &str = "Logged in successfully!";
pub const SIGNUP_SUCCEEDED: &str = "User created successfully!";

pub const EMAIL_REQUIRED: &str = "Email is required.";
pub const PASSWORD_REQUIRED: &str = "Password is required.";
pub const NAME_REQUIRED: &str = "Name is required.";
pub const DOCUMENT_NAME_REQUIRED: &str = "Document name cannot be empty.";

pub const CONVERT_FAILED: &str = "Failed to convert text. Please try again.";
pub const RENAME_FAILED: &str = "Failed to rename document. Please try again.";
pub const CREATE_FAILED: &str = "Failed to create document. Please try again.";
pub const DUPLICATE_DOCUMENT: &str = "A document with this ID already exists.";
pub const SAVE_FAILED: &str = "Failed to save changes";
pub const LOAD_FAILED: &str = "Failed to load document";
pub const NOT_FOUND: &str = "Document not found";
pub const ACCESS_DENIED: &str = "You do not have access to this document.";
pub const EDIT_CONFLICT: &str =
    "This document was changed elsewhere. Reload to see the latest version.";

pub fn password_too_short(min_length: usize) -> String {
    format!(
        "Password is too short. Use at least {} characters.",
        min_length
    )
}

/// Message for a failed sign-in.
pub fn login_error(err: &PortError) -> String {
    match identity_code(err) {
        Some(INVALID_CREDENTIAL) => "Invalid email or password.".to_string(),
        Some(INVALID_EMAIL) => "Invalid email address.".to_string(),
        Some(TOO_MANY_REQUESTS) => "Too many login attempts. Please try again later.".to_string(),
        _ => raw_or(err, LOGIN_FAILED),
    }
}

/// Message for a failed sign-up.
pub fn signup_error(err: &PortError) -> String {
    match identity_code(err) {
        Some(EMAIL_ALREADY_IN_USE) => "This email is already registered.".to_string(),
        Some(WEAK_PASSWORD) => "Password is too weak. Please use a stronger password.".to_string(),
        Some(INVALID_EMAIL) => "Invalid email address.".to_string(),
        _ => raw_or(err, SIGNUP_FAILED),
    }
}

/// Message for a failed document load.
pub fn access_error(err: &AccessError) -> &'static str {
    match err {
        AccessError::NotFound => NOT_FOUND,
        AccessError::Denied => ACCESS_DENIED,
        AccessError::Unavailable(_) => LOAD_FAILED,
    }
}

/// Message for a failed store write, with `fallback` for plain failures.
pub fn write_error(err: &PortError, fallback: &'static str) -> &'static str {
    match err {
        PortError::Conflict(_) => EDIT_CONFLICT,
        PortError::Unauthorized => ACCESS_DENIED,
        PortError::NotFound(_) => NOT_FOUND,
        _ => fallback,
    }
}

fn identity_code(err: &PortError) -> Option<&str> {
    match err {
        PortError::Identity { code, .. } => Some(code.as_str()),
        _ => None,
    }
}

/// The unmapped path: surface whatever the service said.
fn raw_or(err: &PortError, fallback: &str) -> String {
    let raw = match err {
        PortError::Identity { message, .. } => message.clone(),
        other => other.to_string(),
    };
    if raw.trim().is_empty() {
        fallback.to_string()
    } else {
        raw
    }
}
