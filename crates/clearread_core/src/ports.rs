//! crates/clearread_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client relies on.
//! These traits form the boundary of the hexagonal architecture: the identity
//! service, the document store and the conversion API are all external, and the
//! rest of the application only ever sees them through these ports.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::{CreatedDocument, Document, DocumentPatch, Identity, UserProfile};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// An error reported by the identity service, carrying its opaque code.
    #[error("{message} ({code})")]
    Identity { code: String, message: String },
    /// A non-success HTTP status from a remote API.
    #[error("Remote API answered with status {0}")]
    Http(u16),
    #[error("Write conflict: {0}")]
    Conflict(String),
}

impl PortError {
    pub fn identity(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Identity {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Subscribes to identity changes.
    ///
    /// The first item is the service's verdict on any stored credential; every
    /// later item corresponds to one sign-in or sign-out.
    fn identity_changes(&self) -> BoxStream<'static, Option<Identity>>;

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<Identity>;

    /// Creates the account and signs the new user in.
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<Identity>;

    async fn sign_out(&self) -> PortResult<()>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- User Profiles (`users/{uid}`) ---
    async fn get_user_profile(&self, uid: &str) -> PortResult<UserProfile>;

    async fn put_user_profile(&self, profile: &UserProfile) -> PortResult<()>;

    // --- Documents (`documents/{id}`) ---
    async fn get_document(&self, document_id: &str) -> PortResult<Document>;

    async fn insert_document(&self, document: &Document) -> PortResult<()>;

    /// Applies a partial update on behalf of `owner_uid`.
    ///
    /// Fails with `Unauthorized` if the document belongs to someone else and with
    /// `Conflict` if `patch.expected_version` no longer matches.
    async fn update_document(
        &self,
        document_id: &str,
        owner_uid: &str,
        patch: DocumentPatch,
    ) -> PortResult<Document>;

    async fn list_documents_by_owner(&self, owner_uid: &str) -> PortResult<Vec<Document>>;
}

/// The external HTTP service that creates, converts and renames documents.
#[async_trait]
pub trait ConversionService: Send + Sync {
    async fn create_document(&self, user_id: &str) -> PortResult<CreatedDocument>;

    /// Returns the dyslexia-friendly rendition of `original_text`.
    async fn convert_text(&self, user_id: &str, original_text: &str) -> PortResult<String>;

    /// Returns the name the service actually stored.
    async fn rename_document(
        &self,
        user_id: &str,
        document_id: &str,
        old_name: &str,
        new_name: &str,
    ) -> PortResult<String>;
}
