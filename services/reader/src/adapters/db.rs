//! services/reader/src/adapters/db.rs
//!
//! This module contains the database adapter, the Postgres implementation of
//! the `DocumentStore` port and of the identity service's `CredentialStore`.
//! It handles all interactions with the database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clearread_core::domain::{Document, DocumentPatch, UserProfile};
use clearread_core::ports::{DocumentStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};

use crate::adapters::identity::{CredentialStore, StoredCredential};

const DOCUMENT_COLUMNS: &str =
    "id, user_id, name, original_text, converted_text, created_at, version";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` and `CredentialStore` ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    uid: String,
    email: String,
    display_name: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> UserProfile {
        UserProfile {
            uid: self.uid,
            email: self.email,
            display_name: self.display_name,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct DocumentRecord {
    id: String,
    user_id: String,
    name: Option<String>,
    original_text: String,
    converted_text: String,
    created_at: Option<DateTime<Utc>>,
    version: i64,
}
impl DocumentRecord {
    fn to_domain(self) -> Document {
        Document {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            original_text: self.original_text,
            converted_text: self.converted_text,
            timestamp: self.created_at,
            version: self.version.max(0) as u64,
        }
    }
}

#[derive(FromRow)]
struct CredentialRecord {
    uid: String,
    email: String,
    hashed_password: String,
}
impl CredentialRecord {
    fn to_domain(self) -> StoredCredential {
        StoredCredential {
            uid: self.uid,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for DbAdapter {
    async fn get_user_profile(&self, uid: &str) -> PortResult<UserProfile> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT uid, email, display_name, created_at FROM users WHERE uid = $1",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", uid)))?;
        Ok(record.to_domain())
    }

    async fn put_user_profile(&self, profile: &UserProfile) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO users (uid, email, display_name, created_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (uid) DO UPDATE SET email = EXCLUDED.email, display_name = EXCLUDED.display_name",
        )
        .bind(&profile.uid)
        .bind(&profile.email)
        .bind(&profile.display_name)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_document(&self, document_id: &str) -> PortResult<Document> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {} FROM documents WHERE id = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Document {} not found", document_id)))?;
        Ok(record.to_domain())
    }

    async fn insert_document(&self, document: &Document) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO documents (id, user_id, name, original_text, converted_text, created_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&document.id)
        .bind(&document.user_id)
        .bind(&document.name)
        .bind(&document.original_text)
        .bind(&document.converted_text)
        .bind(document.timestamp)
        .bind(document.version as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict(format!("Document {} already exists", document.id))
            } else {
                unexpected(e)
            }
        })?;
        Ok(())
    }

    async fn update_document(
        &self,
        document_id: &str,
        owner_uid: &str,
        patch: DocumentPatch,
    ) -> PortResult<Document> {
        let expected_version = patch.expected_version.map(|v| v as i64);
        let updated = sqlx::query_as::<_, DocumentRecord>(&format!(
            "UPDATE documents SET \
                name = COALESCE($3, name), \
                original_text = COALESCE($4, original_text), \
                converted_text = COALESCE($5, converted_text), \
                version = version + 1 \
             WHERE id = $1 AND user_id = $2 AND ($6::BIGINT IS NULL OR version = $6) \
             RETURNING {}",
            DOCUMENT_COLUMNS
        ))
        .bind(document_id)
        .bind(owner_uid)
        .bind(patch.name)
        .bind(patch.original_text)
        .bind(patch.converted_text)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        if let Some(record) = updated {
            return Ok(record.to_domain());
        }

        // Nothing matched: work out which condition failed.
        let current = self.get_document(document_id).await?;
        if current.user_id != owner_uid {
            return Err(PortError::Unauthorized);
        }
        Err(PortError::Conflict(format!(
            "Document {} is at version {}, expected {}",
            document_id,
            current.version,
            expected_version.unwrap_or_default()
        )))
    }

    async fn list_documents_by_owner(&self, owner_uid: &str) -> PortResult<Vec<Document>> {
        let records = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {} FROM documents WHERE user_id = $1 ORDER BY created_at ASC NULLS FIRST, id ASC",
            DOCUMENT_COLUMNS
        ))
        .bind(owner_uid)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let documents = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(documents)
    }
}

//=========================================================================================
// `CredentialStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialStore for DbAdapter {
    async fn find_by_email(&self, email: &str) -> PortResult<Option<StoredCredential>> {
        let record = sqlx::query_as::<_, CredentialRecord>(
            "SELECT uid, email, hashed_password FROM credentials WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(CredentialRecord::to_domain))
    }

    async fn find_by_uid(&self, uid: &str) -> PortResult<Option<StoredCredential>> {
        let record = sqlx::query_as::<_, CredentialRecord>(
            "SELECT uid, email, hashed_password FROM credentials WHERE uid = $1",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(CredentialRecord::to_domain))
    }

    async fn insert(&self, credential: &StoredCredential) -> PortResult<()> {
        sqlx::query("INSERT INTO credentials (uid, email, hashed_password) VALUES ($1, $2, $3)")
            .bind(&credential.uid)
            .bind(&credential.email)
            .bind(&credential.hashed_password)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortError::Conflict(format!("Email {} already registered", credential.email))
                } else {
                    unexpected(e)
                }
            })?;
        Ok(())
    }
}
