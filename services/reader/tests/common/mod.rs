//! Shared fakes and fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use clearread_core::{
    ConversionService, CreatedDocument, Document, DocumentPatch, DocumentStore, Identity,
    IdentityService, PortError, PortResult,
};
use futures::stream::{self, BoxStream, StreamExt};
use reader_lib::adapters::{InMemoryCredentialStore, InMemoryDocumentStore, LocalIdentityService};
use reader_lib::config::Config;
use reader_lib::session::SessionProvider;
use reader_lib::state::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const CONVERTED: &str = "The cat sat.\n\nOn the mat.";

//=========================================================================================
// Conversion API
//=========================================================================================

/// A scriptable conversion API that counts every call.
#[derive(Default)]
pub struct FakeConversion {
    pub create_calls: AtomicUsize,
    pub convert_calls: AtomicUsize,
    pub rename_calls: AtomicUsize,
    /// Every call fails with this error when set.
    pub fail_with: Mutex<Option<PortError>>,
    /// `create_document` always answers with this id when set.
    pub fixed_id: Mutex<Option<String>>,
    /// `convert_text` never finishes when true; `convert_started` fires first.
    pub hang_on_convert: Mutex<bool>,
    pub convert_started: Notify,
    /// Created and renamed documents are written here, like the real API does.
    pub store: Option<Arc<InMemoryDocumentStore>>,
}

impl FakeConversion {
    pub fn backed_by(store: Arc<InMemoryDocumentStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    pub fn failing(self, error: PortError) -> Self {
        *self.fail_with.lock().unwrap() = Some(error);
        self
    }

    pub fn with_fixed_id(self, id: &str) -> Self {
        *self.fixed_id.lock().unwrap() = Some(id.to_string());
        self
    }

    pub fn hanging(self) -> Self {
        *self.hang_on_convert.lock().unwrap() = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
            + self.convert_calls.load(Ordering::SeqCst)
            + self.rename_calls.load(Ordering::SeqCst)
    }

    fn failure(&self) -> PortResult<()> {
        match self.fail_with.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConversionService for FakeConversion {
    async fn create_document(&self, user_id: &str) -> PortResult<CreatedDocument> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.failure()?;
        let id = self
            .fixed_id
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        if let Some(store) = &self.store {
            // A repeated fixed id is already stored; keep the first record.
            let _ = store.insert_document(&blank_document(&id, user_id)).await;
        }
        Ok(CreatedDocument { id, name: None })
    }

    async fn convert_text(&self, _user_id: &str, original_text: &str) -> PortResult<String> {
        self.convert_calls.fetch_add(1, Ordering::SeqCst);
        self.convert_started.notify_one();
        let hang = *self.hang_on_convert.lock().unwrap();
        if hang {
            futures::future::pending::<()>().await;
        }
        self.failure()?;
        if original_text.is_empty() {
            return Err(PortError::Http(422));
        }
        Ok(CONVERTED.to_string())
    }

    async fn rename_document(
        &self,
        user_id: &str,
        document_id: &str,
        _old_name: &str,
        new_name: &str,
    ) -> PortResult<String> {
        self.rename_calls.fetch_add(1, Ordering::SeqCst);
        self.failure()?;
        if let Some(store) = &self.store {
            let patch = DocumentPatch {
                name: Some(new_name.to_string()),
                ..DocumentPatch::default()
            };
            store.update_document(document_id, user_id, patch).await?;
        }
        Ok(new_name.to_string())
    }
}

pub fn blank_document(id: &str, user_id: &str) -> Document {
    Document {
        id: id.to_string(),
        user_id: user_id.to_string(),
        name: None,
        original_text: String::new(),
        converted_text: String::new(),
        timestamp: Some(Utc::now()),
        version: 0,
    }
}

//=========================================================================================
// Identity Services
//=========================================================================================

/// An identity service that never delivers its first verdict and rejects every
/// call with a fixed error.
pub struct StuckIdentity {
    pub calls: AtomicUsize,
    pub error: PortError,
}

impl StuckIdentity {
    pub fn new(error: PortError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            error,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityService for StuckIdentity {
    fn identity_changes(&self) -> BoxStream<'static, Option<Identity>> {
        stream::pending().boxed()
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> PortResult<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> PortResult<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    async fn sign_out(&self) -> PortResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

pub fn local_identity() -> Arc<LocalIdentityService> {
    Arc::new(LocalIdentityService::new(
        Arc::new(InMemoryCredentialStore::new()),
        &Config::default(),
    ))
}

//=========================================================================================
// Application State
//=========================================================================================

pub struct Harness {
    pub state: AppState,
    pub provider: SessionProvider,
    pub store: Arc<InMemoryDocumentStore>,
    pub conversion: Arc<FakeConversion>,
}

impl Harness {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        store: Arc<InMemoryDocumentStore>,
        conversion: FakeConversion,
    ) -> Self {
        Self::with_config(identity, store, conversion, Config::default())
    }

    pub fn with_config(
        identity: Arc<dyn IdentityService>,
        store: Arc<InMemoryDocumentStore>,
        conversion: FakeConversion,
        config: Config,
    ) -> Self {
        let conversion = Arc::new(conversion);
        let provider = SessionProvider::start(identity.clone());
        let state = AppState {
            identity,
            store: store.clone(),
            conversion: conversion.clone(),
            session: provider.handle(),
            config: Arc::new(config),
        };
        Self {
            state,
            provider,
            store,
            conversion,
        }
    }
}

/// A harness whose session already holds a freshly registered user.
pub async fn signed_in(conversion: impl FnOnce(Arc<InMemoryDocumentStore>) -> FakeConversion) -> (Harness, Identity) {
    let identity_service = local_identity();
    identity_service.restore().await;
    let store = Arc::new(InMemoryDocumentStore::new());
    let harness = Harness::new(identity_service.clone(), store.clone(), conversion(store));
    let identity = identity_service
        .sign_up("reader@example.com", "correct-horse")
        .await
        .unwrap();
    let mut session = harness.state.session.clone();
    session
        .wait_for(|s| s.identity.as_ref() == Some(&identity))
        .await
        .unwrap();
    (harness, identity)
}

/// Stores a document owned by `owner` with the given original text.
pub async fn stored_document(store: &InMemoryDocumentStore, id: &str, owner: &str, text: &str) -> Document {
    let document = Document {
        name: Some("Chapter One".to_string()),
        original_text: text.to_string(),
        ..blank_document(id, owner)
    };
    store.insert_document(&document).await.unwrap();
    document
}
