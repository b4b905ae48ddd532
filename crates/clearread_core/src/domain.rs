//! crates/clearread_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};

/// Name shown for documents that were never given one.
pub const UNTITLED_DOCUMENT: &str = "Untitled Document";

/// The authenticated user record issued by the identity service.
///
/// The application only ever holds a read reference to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

/// Profile written once at signup under `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// A user-owned record holding the original and converted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    /// The owner's `uid`.
    pub user_id: String,
    pub name: Option<String>,
    pub original_text: String,
    pub converted_text: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// Incremented by every write to the store.
    pub version: u64,
}

impl Document {
    /// The stored name, or the placeholder for unnamed documents.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNTITLED_DOCUMENT,
        }
    }

    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        self.user_id == identity.uid
    }
}

/// A partial update of a document. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPatch {
    pub name: Option<String>,
    pub original_text: Option<String>,
    pub converted_text: Option<String>,
    /// When set, the write only succeeds if the stored version still matches.
    pub expected_version: Option<u64>,
}

impl DocumentPatch {
    pub fn original_text(text: impl Into<String>) -> Self {
        Self {
            original_text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn converted_text(text: impl Into<String>) -> Self {
        Self {
            converted_text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn expecting_version(mut self, version: Option<u64>) -> Self {
        self.expected_version = version;
        self
    }
}

/// What the conversion API answers when it creates a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedDocument {
    pub id: String,
    pub name: Option<String>,
}
