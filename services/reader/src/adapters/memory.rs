//! services/reader/src/adapters/memory.rs
//!
//! In-memory implementations of the storage ports. Used when no `DATABASE_URL`
//! is configured and by the test suite.

use async_trait::async_trait;
use clearread_core::{Document, DocumentPatch, DocumentStore, PortError, PortResult, UserProfile};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::adapters::identity::{CredentialStore, StoredCredential};

//=========================================================================================
// Document Store
//=========================================================================================

/// Keeps `users/{uid}` and `documents/{id}` in two maps.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    users: RwLock<HashMap<String, UserProfile>>,
    documents: RwLock<HashMap<String, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_user_profile(&self, uid: &str) -> PortResult<UserProfile> {
        self.users
            .read()
            .await
            .get(uid)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", uid)))
    }

    async fn put_user_profile(&self, profile: &UserProfile) -> PortResult<()> {
        self.users
            .write()
            .await
            .insert(profile.uid.clone(), profile.clone());
        Ok(())
    }

    async fn get_document(&self, document_id: &str) -> PortResult<Document> {
        self.documents
            .read()
            .await
            .get(document_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Document {} not found", document_id)))
    }

    async fn insert_document(&self, document: &Document) -> PortResult<()> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&document.id) {
            return Err(PortError::Conflict(format!(
                "Document {} already exists",
                document.id
            )));
        }
        documents.insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn update_document(
        &self,
        document_id: &str,
        owner_uid: &str,
        patch: DocumentPatch,
    ) -> PortResult<Document> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(document_id)
            .ok_or_else(|| PortError::NotFound(format!("Document {} not found", document_id)))?;

        if document.user_id != owner_uid {
            return Err(PortError::Unauthorized);
        }
        if let Some(expected) = patch.expected_version {
            if expected != document.version {
                return Err(PortError::Conflict(format!(
                    "Document {} is at version {}, expected {}",
                    document_id, document.version, expected
                )));
            }
        }

        if let Some(name) = patch.name {
            document.name = Some(name);
        }
        if let Some(original_text) = patch.original_text {
            document.original_text = original_text;
        }
        if let Some(converted_text) = patch.converted_text {
            document.converted_text = converted_text;
        }
        document.version += 1;

        Ok(document.clone())
    }

    async fn list_documents_by_owner(&self, owner_uid: &str) -> PortResult<Vec<Document>> {
        let mut owned: Vec<Document> = self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.user_id == owner_uid)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }
}

//=========================================================================================
// Credential Store
//=========================================================================================

/// Credentials keyed by lower-cased email.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    by_email: RwLock<HashMap<String, StoredCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> PortResult<Option<StoredCredential>> {
        Ok(self.by_email.read().await.get(email).cloned())
    }

    async fn find_by_uid(&self, uid: &str) -> PortResult<Option<StoredCredential>> {
        Ok(self
            .by_email
            .read()
            .await
            .values()
            .find(|c| c.uid == uid)
            .cloned())
    }

    async fn insert(&self, credential: &StoredCredential) -> PortResult<()> {
        let mut by_email = self.by_email.write().await;
        if by_email.contains_key(&credential.email) {
            return Err(PortError::Conflict(format!(
                "Email {} already registered",
                credential.email
            )));
        }
        by_email.insert(credential.email.clone(), credential.clone());
        Ok(())
    }
}
