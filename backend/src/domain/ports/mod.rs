//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod document_store;
mod password_hasher;
mod schema;

#[cfg(test)]
pub use document_store::MockDocumentStore;
pub use document_store::{DocumentStore, StoreError};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
pub use schema::{CollectionSchema, FieldKind, Populate, PopulateLink, WriteKind};
