pub mod conversion_http;
pub mod db;
pub mod identity;
pub mod memory;

pub use conversion_http::HttpConversionAdapter;
pub use db::DbAdapter;
pub use identity::{CredentialStore, LocalIdentityService, StoredCredential};
pub use memory::{InMemoryCredentialStore, InMemoryDocumentStore};
