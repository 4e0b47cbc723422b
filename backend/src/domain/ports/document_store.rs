//! Port abstraction for document persistence adapters and their errors.
use api_query::{Filter, ListQuery};
use async_trait::async_trait;
use tracing::error;

use crate::domain::{Collection, Document, DocumentId, Error, ValidationErrors};

use super::Populate;
use super::define_port_error;

define_port_error! {
    /// Failures raised by document store adapters, tagged by kind.
    pub enum StoreError {
        /// Schema validation rejected the write.
        Validation { errors: ValidationErrors } => "{errors}",
        /// A unique index already holds the value.
        Duplicate { field: String, value: String } => "duplicate key on {field}: {value}",
        /// A value could not be converted to the type of its field.
        Cast { path: String, value: String } => "cast to {path} failed for value {value}",
        /// The store could not be reached.
        Connection { message: String } => "document store connection failed: {message}",
        /// The store rejected or failed the operation.
        Query { message: String } => "document store query failed: {message}",
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::Validation { errors } => {
                Self::validation_failed(errors.to_string()).with_details(errors.to_details())
            }
            StoreError::Duplicate { value, .. } => Self::conflict(format!(
                "Duplicate field value: \"{value}\", Please use another value"
            )),
            StoreError::Cast { path, value } => Self::malformed_id(format!("Invalid {path}: {value}.")),
            StoreError::Connection { .. } => {
                error!(error = %err, "document store unavailable");
                Self::service_unavailable("The service is temporarily unavailable").with_cause(&err)
            }
            StoreError::Query { .. } => Self::internal("Document store query failed").with_cause(&err),
        }
    }
}

/// Document persistence consumed by the resource services.
///
/// Every read honours the collection schema: invisible documents are never
/// returned, hidden fields are stripped unless revealed, computed fields are
/// added and automatic populations run. Writes are validated and checked
/// against unique indexes atomically.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Validate and insert a new document, returning it as stored.
    async fn insert(&self, collection: Collection, document: Document)
    -> Result<Document, StoreError>;

    /// Return documents matching `query`, running `populate` on top of the
    /// schema's automatic populations.
    async fn find(
        &self,
        collection: Collection,
        query: &ListQuery,
        populate: &[Populate],
    ) -> Result<Vec<Document>, StoreError>;

    /// Count visible documents matching `filter`.
    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError>;

    /// Fetch a visible document by identifier.
    async fn find_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
        populate: &[Populate],
    ) -> Result<Option<Document>, StoreError>;

    /// Fetch the first visible document matching `filter` without
    /// populations, including the listed hidden fields.
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
        reveal: &[&'static str],
    ) -> Result<Option<Document>, StoreError>;

    /// Validate and merge `patch` into a visible document, returning the
    /// updated document or `None` when absent.
    async fn update_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
        patch: Document,
    ) -> Result<Option<Document>, StoreError>;

    /// Remove a visible document, returning it or `None` when absent.
    async fn delete_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> Result<Option<Document>, StoreError>;
}
