pub mod domain;
pub mod ports;

pub use domain::{CreatedDocument, Document, DocumentPatch, Identity, UserProfile, UNTITLED_DOCUMENT};
pub use ports::{ConversionService, DocumentStore, IdentityService, PortError, PortResult};
