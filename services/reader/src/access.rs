//! services/reader/src/access.rs
//!
//! The document access gate. A document screen only ever receives a record
//! through `open_document`, which checks ownership before handing anything out.

use clearread_core::{Document, DocumentStore, Identity, PortError};
use tracing::{error, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("document not found")]
    NotFound,
    /// The document exists but belongs to someone else. Carries nothing from it.
    #[error("access denied")]
    Denied,
    #[error("document store unavailable: {0}")]
    Unavailable(PortError),
}

/// Fetches `document_id` and returns it only if `identity` owns it.
pub async fn open_document(
    store: &dyn DocumentStore,
    document_id: &str,
    identity: &Identity,
) -> Result<Document, AccessError> {
    let document = match store.get_document(document_id).await {
        Ok(document) => document,
        Err(PortError::NotFound(_)) => return Err(AccessError::NotFound),
        Err(PortError::Unauthorized) => return Err(AccessError::Denied),
        Err(e) => {
            error!(document_id, "Failed to fetch document: {:?}", e);
            return Err(AccessError::Unavailable(e));
        }
    };

    if !document.is_owned_by(identity) {
        warn!(document_id, uid = %identity.uid, "Unauthorized document access.");
        return Err(AccessError::Denied);
    }

    Ok(document)
}
