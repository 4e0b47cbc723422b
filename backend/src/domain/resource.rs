//! Generic create/read/update/delete/list operations shared by every
//! resource.
//!
//! A [`Resource`] marker binds a collection to its client-facing label and
//! per-resource hooks; [`ResourceService`] runs the operations against the
//! [`DocumentStore`] port. Every failure is returned as a tagged [`Error`].

use std::marker::PhantomData;
use std::sync::Arc;

use api_query::{Filter, ListQueryBuilder, QueryError, QueryParams};
use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{DocumentStore, Populate};
use crate::domain::tour::TOUR_REVIEWS;
use crate::domain::user::{PASSWORD_CHANGED_AT_FIELD, PASSWORD_FIELD};
use crate::domain::{Collection, Document, DocumentId, Error, ID_FIELD, VERSION_FIELD};

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::PageNotFound { .. } => Self::not_found(err.to_string()),
            other => Self::invalid_request(other.to_string()),
        }
    }
}

/// A collection exposed through the generic operations.
pub trait Resource: Send + Sync + 'static {
    /// Backing collection.
    const COLLECTION: Collection;
    /// Singular name used in client-facing messages.
    const LABEL: &'static str;

    /// Populations applied when fetching a single document.
    fn detail_populate() -> &'static [Populate] {
        &[]
    }

    /// Reject patches the generic update must not apply.
    ///
    /// # Errors
    /// Returns an operational error describing the rejected patch.
    fn guard_patch(_patch: &Document) -> Result<(), Error> {
        Ok(())
    }
}

/// Tours.
#[derive(Debug, Clone, Copy)]
pub struct TourResource;

impl Resource for TourResource {
    const COLLECTION: Collection = Collection::Tours;
    const LABEL: &'static str = "tour";

    fn detail_populate() -> &'static [Populate] {
        &[TOUR_REVIEWS]
    }
}

/// Users, as managed by administrators.
#[derive(Debug, Clone, Copy)]
pub struct UserResource;

impl Resource for UserResource {
    const COLLECTION: Collection = Collection::Users;
    const LABEL: &'static str = "user";

    fn guard_patch(patch: &Document) -> Result<(), Error> {
        if [PASSWORD_FIELD, "passwordConfirm", PASSWORD_CHANGED_AT_FIELD]
            .iter()
            .any(|field| patch.contains_key(*field))
        {
            return Err(Error::invalid_request(
                "This route is not for password updates. Please use /updateMyPassword.",
            ));
        }
        Ok(())
    }
}

/// Reviews.
#[derive(Debug, Clone, Copy)]
pub struct ReviewResource;

impl Resource for ReviewResource {
    const COLLECTION: Collection = Collection::Reviews;
    const LABEL: &'static str = "review";
}

/// Bookings.
#[derive(Debug, Clone, Copy)]
pub struct BookingResource;

impl Resource for BookingResource {
    const COLLECTION: Collection = Collection::Bookings;
    const LABEL: &'static str = "booking";
}

/// Side effect run after every successful write through a service.
///
/// Receives the document as written (or as it was before deletion).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WriteHook: Send + Sync {
    /// React to a completed write.
    ///
    /// # Errors
    /// Failures are returned to the caller of the write.
    async fn after_write(&self, document: &Document) -> Result<(), Error>;
}

/// One page of a list operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    /// Number of documents in this page.
    pub results: usize,
    /// Documents in this page.
    pub documents: Vec<Document>,
}

/// Generic operations for resource `R`.
pub struct ResourceService<R> {
    store: Arc<dyn DocumentStore>,
    hook: Option<Arc<dyn WriteHook>>,
    resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            hook: self.hook.clone(),
            resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceService<R> {
    /// Create a service over `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            hook: None,
            resource: PhantomData,
        }
    }

    /// Run `hook` after every create, update and delete.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn WriteHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    fn not_found() -> Error {
        Error::not_found(format!("No {} found with that ID", R::LABEL))
    }

    fn parse_id(raw: &str) -> Result<DocumentId, Error> {
        raw.parse()
            .map_err(|_| Error::malformed_id(format!("Invalid {ID_FIELD}: {raw}.")))
    }

    fn strip_reserved(document: &mut Document) {
        document.remove(ID_FIELD);
        document.remove(VERSION_FIELD);
    }

    async fn run_hook(&self, document: &Document) -> Result<(), Error> {
        match &self.hook {
            Some(hook) => hook.after_write(document).await,
            None => Ok(()),
        }
    }

    /// List documents matching `base` and the query parameters.
    ///
    /// # Errors
    /// Rejects unsupported filters, pages past the end of the results and
    /// store failures.
    pub async fn list(&self, base: Filter, params: QueryParams) -> Result<Listing, Error> {
        let query = ListQueryBuilder::new(params)
            .with_base_filter(base)
            .filter()?
            .sort()
            .limit_fields()
            .paginate()
            .build();
        if let Some(window) = query.pagination() {
            let total = self.store.count(R::COLLECTION, query.filter()).await?;
            window.ensure_within(total)?;
        }
        let documents = self.store.find(R::COLLECTION, &query, &[]).await?;
        debug!(collection = %R::COLLECTION, results = documents.len(), "listed documents");
        Ok(Listing {
            results: documents.len(),
            documents,
        })
    }

    /// Fetch one document by its raw identifier.
    ///
    /// # Errors
    /// Returns `malformed_id` for unparsable identifiers and `not_found` when
    /// absent.
    pub async fn get(&self, raw_id: &str) -> Result<Document, Error> {
        let id = Self::parse_id(raw_id)?;
        self.store
            .find_by_id(R::COLLECTION, id, R::detail_populate())
            .await?
            .ok_or_else(Self::not_found)
    }

    /// Validate and insert a new document.
    ///
    /// # Errors
    /// Returns validation, conflict and store failures.
    pub async fn create(&self, mut body: Document) -> Result<Document, Error> {
        Self::strip_reserved(&mut body);
        let created = self.store.insert(R::COLLECTION, body).await?;
        self.run_hook(&created).await?;
        Ok(created)
    }

    /// Validate and apply a partial update.
    ///
    /// # Errors
    /// Returns `not_found` when absent, plus validation, conflict and store
    /// failures.
    pub async fn update(&self, raw_id: &str, mut patch: Document) -> Result<Document, Error> {
        let id = Self::parse_id(raw_id)?;
        Self::strip_reserved(&mut patch);
        R::guard_patch(&patch)?;
        let updated = self
            .store
            .update_by_id(R::COLLECTION, id, patch)
            .await?
            .ok_or_else(Self::not_found)?;
        self.run_hook(&updated).await?;
        Ok(updated)
    }

    /// Remove a document.
    ///
    /// # Errors
    /// Returns `not_found` when absent.
    pub async fn delete(&self, raw_id: &str) -> Result<(), Error> {
        let id = Self::parse_id(raw_id)?;
        let removed = self
            .store
            .delete_by_id(R::COLLECTION, id)
            .await?
            .ok_or_else(Self::not_found)?;
        self.run_hook(&removed).await
    }
}
