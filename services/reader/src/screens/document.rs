//! services/reader/src/screens/document.rs
//!
//! The document screen: edit the original text, convert it, rename the
//! document, and tune how the converted text is displayed.
//!
//! The record only reaches this screen through the access gate, and the edit
//! buffers are filled after the ownership check passed. Mutations never apply
//! optimistically: local state changes only once the external call succeeded.

use clearread_core::{Document, DocumentPatch, Identity, UNTITLED_DOCUMENT};
use tracing::{error, info, warn};

use crate::access::{self, AccessError};
use crate::screens::messages;
use crate::screens::scope::ScreenScope;
use crate::screens::typography::Typography;
use crate::state::AppState;

/// What the screen is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentView {
    /// The gate allowed access; the edit buffers are populated.
    Loaded,
    /// The gate refused or failed; only the message is shown.
    Unavailable(AccessError),
    /// Disposed before the document arrived.
    Detached,
}

pub struct DocumentScreen {
    state: AppState,
    scope: ScreenScope,
    identity: Identity,
    document_id: String,
    version: Option<u64>,
    pub view: DocumentView,
    pub original_text: String,
    pub converted_text: String,
    pub name: String,
    pub old_name: String,
    pub is_editing_name: bool,
    pub error: Option<String>,
    pub typography: Typography,
}

impl DocumentScreen {
    /// Mounts the screen for `document_id` on behalf of `identity`.
    pub async fn mount(state: AppState, identity: Identity, document_id: &str) -> Self {
        let mut screen = Self {
            state,
            scope: ScreenScope::new(),
            identity,
            document_id: document_id.to_string(),
            version: None,
            view: DocumentView::Detached,
            original_text: String::new(),
            converted_text: String::new(),
            name: String::new(),
            old_name: String::new(),
            is_editing_name: false,
            error: None,
            typography: Typography::default(),
        };

        let store = screen.state.store.clone();
        let gate = access::open_document(store.as_ref(), &screen.document_id, &screen.identity);
        let opened = screen.scope.run(gate).await;
        match opened {
            Some(Ok(document)) => screen.populate(document),
            Some(Err(e)) => {
                screen.error = Some(messages::access_error(&e).to_string());
                screen.view = DocumentView::Unavailable(e);
            }
            None => {}
        }
        screen
    }

    fn populate(&mut self, document: Document) {
        let name = document.display_name().to_string();
        self.version = Some(document.version);
        self.original_text = document.original_text;
        self.converted_text = document.converted_text;
        self.old_name = name.clone();
        self.name = name;
        self.view = DocumentView::Loaded;
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn is_loaded(&self) -> bool {
        self.view == DocumentView::Loaded
    }

    pub fn set_original_text(&mut self, text: impl Into<String>) {
        if self.is_loaded() {
            self.original_text = text.into();
        }
    }

    pub fn start_editing_name(&mut self) {
        if self.is_loaded() {
            self.is_editing_name = true;
        }
    }

    pub fn cancel_editing_name(&mut self) {
        self.is_editing_name = false;
        self.name = self.old_name.clone();
    }

    /// Writes the original text to the store.
    pub async fn save_original(&mut self) -> bool {
        if !self.is_loaded() {
            return false;
        }
        self.error = None;
        match self
            .write(DocumentPatch::original_text(self.original_text.clone()), messages::SAVE_FAILED)
            .await
        {
            Some(Ok(())) => true,
            Some(Err(message)) => {
                self.error = Some(message.to_string());
                false
            }
            None => false,
        }
    }

    /// Saves the original text, then asks the conversion API for the
    /// dyslexia-friendly version.
    pub async fn convert(&mut self) -> bool {
        if !self.is_loaded() || self.original_text.is_empty() {
            return false;
        }
        self.error = None;

        // An edit conflict keeps its own message; other failures read as a failed conversion.
        match self
            .write(DocumentPatch::original_text(self.original_text.clone()), messages::CONVERT_FAILED)
            .await
        {
            Some(Ok(())) => {}
            Some(Err(message)) => {
                self.error = Some(message.to_string());
                return false;
            }
            None => return false,
        }

        let conversion = self.state.conversion.clone();
        let uid = self.identity.uid.clone();
        let original_text = self.original_text.clone();
        let Some(result) = self
            .scope
            .run(async move { conversion.convert_text(&uid, &original_text).await })
            .await
        else {
            return false;
        };

        let converted_text = match result {
            Ok(text) => text,
            Err(e) => {
                error!(document_id = %self.document_id, "Failed to convert text: {}", e);
                self.error = Some(messages::CONVERT_FAILED.to_string());
                return false;
            }
        };

        // Keep the stored copy in step; the screen shows the result either way.
        match self
            .write(DocumentPatch::converted_text(converted_text.clone()), messages::SAVE_FAILED)
            .await
        {
            Some(Err(message)) => warn!(document_id = %self.document_id, "Converted text not saved: {}", message),
            Some(Ok(())) => {}
            None => return false,
        }
        info!(document_id = %self.document_id, "Text converted.");
        self.converted_text = converted_text;
        true
    }

    /// Renames the document to `self.name` through the conversion API.
    ///
    /// Does nothing when the name did not change.
    pub async fn rename(&mut self) -> bool {
        if !self.is_loaded() || self.name == self.old_name {
            return false;
        }
        self.error = None;
        if self.name.trim().is_empty() {
            self.error = Some(messages::DOCUMENT_NAME_REQUIRED.to_string());
            return false;
        }

        let conversion = self.state.conversion.clone();
        let uid = self.identity.uid.clone();
        let document_id = self.document_id.clone();
        let (old_name, new_name) = (self.old_name.clone(), self.name.clone());
        let Some(result) = self
            .scope
            .run(async move {
                conversion
                    .rename_document(&uid, &document_id, &old_name, &new_name)
                    .await
            })
            .await
        else {
            return false;
        };

        match result {
            Ok(stored_name) => {
                let stored_name = if stored_name.is_empty() {
                    UNTITLED_DOCUMENT.to_string()
                } else {
                    stored_name
                };
                info!(document_id = %self.document_id, "Document renamed.");
                self.name = stored_name.clone();
                self.old_name = stored_name;
                self.is_editing_name = false;
                true
            }
            Err(e) => {
                error!(document_id = %self.document_id, "Failed to rename document: {}", e);
                self.error = Some(messages::RENAME_FAILED.to_string());
                false
            }
        }
    }

    /// Sets a new name and renames in one step.
    pub async fn rename_to(&mut self, new_name: &str) -> bool {
        if !self.is_loaded() {
            return false;
        }
        self.name = new_name.to_string();
        let renamed = self.rename().await;
        if !renamed && self.error.is_none() {
            self.is_editing_name = false;
        }
        renamed
    }

    /// Applies `patch` as the owner. `None` means the screen was disposed.
    ///
    /// Failures other than an edit conflict are reported as `fallback`.
    async fn write(&mut self, patch: DocumentPatch, fallback: &'static str) -> Option<Result<(), &'static str>> {
        let expected = if self.state.config.detect_edit_conflicts {
            self.version
        } else {
            None
        };
        let store = self.state.store.clone();
        let document_id = self.document_id.clone();
        let owner = self.identity.uid.clone();
        let result = self
            .scope
            .run(async move {
                store
                    .update_document(&document_id, &owner, patch.expecting_version(expected))
                    .await
            })
            .await?;

        Some(match result {
            Ok(document) => {
                self.version = Some(document.version);
                Ok(())
            }
            Err(e) => {
                error!(document_id = %self.document_id, "Failed to save document: {}", e);
                Err(messages::write_error(&e, fallback))
            }
        })
    }
}
