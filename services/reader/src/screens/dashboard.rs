//! services/reader/src/screens/dashboard.rs
//!
//! The dashboard: greeting, the signed-in user's documents, document creation
//! and logout.

use chrono::{DateTime, Utc};
use clearread_core::{Document, Identity, PortError};
use tracing::{error, info, warn};

use crate::screens::messages;
use crate::screens::scope::ScreenScope;
use crate::state::AppState;

/// Characters of original text shown on a document card.
pub const PREVIEW_CHARS: usize = 100;

/// One card in the document list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCard {
    pub id: String,
    pub title: String,
    pub created: String,
    pub preview: String,
}

impl DocumentCard {
    pub fn from_document(document: &Document) -> Self {
        Self {
            id: document.id.clone(),
            title: document.display_name().to_string(),
            created: format_timestamp(document.timestamp),
            preview: preview(&document.original_text),
        }
    }
}

pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(at) => at.format("%Y-%m-%d").to_string(),
        None => "N/A".to_string(),
    }
}

pub fn preview(original_text: &str) -> String {
    if original_text.is_empty() {
        return "No content".to_string();
    }
    let head: String = original_text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head)
}

pub struct DashboardScreen {
    state: AppState,
    scope: ScreenScope,
    identity: Identity,
    pub display_name: Option<String>,
    pub documents: Vec<DocumentCard>,
    pub error: Option<String>,
}

impl DashboardScreen {
    /// Mounts the dashboard for `identity`: greeting and document list load
    /// concurrently.
    pub async fn mount(state: AppState, identity: Identity) -> Self {
        let mut screen = Self {
            state,
            scope: ScreenScope::new(),
            identity,
            display_name: None,
            documents: Vec::new(),
            error: None,
        };

        let loads = futures::future::join(screen.fetch_display_name(), screen.fetch_documents());
        let loaded = screen.scope.run(loads).await;
        if let Some((display_name, documents)) = loaded {
            screen.display_name = Some(display_name);
            screen.documents = documents;
        }
        screen
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Asks the conversion API for a new document and refreshes the list.
    pub async fn create_document(&mut self) {
        self.error = None;

        let conversion = self.state.conversion.clone();
        let uid = self.identity.uid.clone();
        let Some(result) = self
            .scope
            .run(async move { conversion.create_document(&uid).await })
            .await
        else {
            return;
        };

        let created = match result {
            Ok(created) => created,
            Err(e) => {
                error!("Failed to create document: {}", e);
                self.error = Some(messages::CREATE_FAILED.to_string());
                return;
            }
        };

        if self.documents.iter().any(|card| card.id == created.id) {
            warn!(document_id = %created.id, "Duplicate document ID detected.");
            self.error = Some(messages::DUPLICATE_DOCUMENT.to_string());
            return;
        }
        info!(document_id = %created.id, "Document created.");

        let Some(mut documents) = self.scope.run(self.fetch_documents()).await else {
            return;
        };
        if !documents.iter().any(|card| card.id == created.id) {
            // The API did not write to this store; record the document here so it can be opened.
            let document = Document {
                id: created.id.clone(),
                user_id: self.identity.uid.clone(),
                name: created.name.clone().filter(|name| !name.is_empty()),
                original_text: String::new(),
                converted_text: String::new(),
                timestamp: Some(Utc::now()),
                version: 0,
            };
            let store = self.state.store.clone();
            let Some(inserted) = self
                .scope
                .run(async move { store.insert_document(&document).await.map(|()| document) })
                .await
            else {
                return;
            };
            match inserted {
                Ok(document) => documents.push(DocumentCard::from_document(&document)),
                Err(PortError::Conflict(_)) => {
                    warn!(document_id = %created.id, "Created document already stored; reloading the list.");
                    let Some(reloaded) = self.scope.run(self.fetch_documents()).await else {
                        return;
                    };
                    documents = reloaded;
                }
                Err(e) => {
                    error!(document_id = %created.id, "Failed to store created document: {}", e);
                    self.error = Some(messages::CREATE_FAILED.to_string());
                    return;
                }
            }
        }
        self.documents = documents;
    }

    /// Signs out. Failures are only logged; the guard reacts to the session.
    pub async fn logout(&mut self) -> bool {
        let identity = self.state.identity.clone();
        match self.scope.run(async move { identity.sign_out().await }).await {
            Some(Ok(())) => true,
            Some(Err(e)) => {
                error!("Logout failed: {}", e);
                false
            }
            None => false,
        }
    }

    async fn fetch_display_name(&self) -> String {
        let fallback = || {
            if self.identity.email.is_empty() {
                "User".to_string()
            } else {
                self.identity.email.clone()
            }
        };
        match self.state.store.get_user_profile(&self.identity.uid).await {
            Ok(profile) if !profile.display_name.is_empty() => profile.display_name,
            Ok(_) | Err(PortError::NotFound(_)) => fallback(),
            Err(e) => {
                error!("Failed to fetch user data: {}", e);
                fallback()
            }
        }
    }

    async fn fetch_documents(&self) -> Vec<DocumentCard> {
        match self.state.store.list_documents_by_owner(&self.identity.uid).await {
            Ok(documents) => documents.iter().map(DocumentCard::from_document).collect(),
            Err(e) => {
                error!("Failed to fetch documents: {}", e);
                Vec::new()
            }
        }
    }
}
