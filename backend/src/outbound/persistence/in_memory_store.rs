//! In-process document store.
//!
//! Collections live behind a single `tokio` read/write lock. Every write
//! validates, checks unique keys and stores the document under one write
//! guard, so concurrent writes cannot both pass a uniqueness check.

use std::collections::HashMap;
use std::sync::Arc;

use api_query::{Filter, ListQuery, Projection};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::ports::{CollectionSchema, DocumentStore, Populate, StoreError, WriteKind};
use crate::domain::{
    BookingSchema, Collection, Document, DocumentId, ID_FIELD, ReviewSchema, TourSchema,
    UserSchema, VERSION_FIELD,
};

use super::matching::CompiledFilter;
use super::ordering;
use super::presentation::{POPULATE_DEPTH, Snapshot};

type Schemas = HashMap<Collection, Arc<dyn CollectionSchema>>;
type Collections = HashMap<Collection, Vec<Document>>;

/// [`DocumentStore`] adapter keeping every collection in memory.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use mockable::DefaultClock;
/// use tour_booking::outbound::persistence::InMemoryDocumentStore;
///
/// let store = InMemoryDocumentStore::with_default_schemas(Arc::new(DefaultClock));
/// # let _ = store;
/// ```
pub struct InMemoryDocumentStore {
    schemas: Schemas,
    collections: RwLock<Collections>,
    clock: Arc<dyn Clock>,
}

impl InMemoryDocumentStore {
    /// Create a store with no registered collections.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            schemas: HashMap::new(),
            collections: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Create a store with the tour, user, review and booking schemas.
    pub fn with_default_schemas(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock)
            .with_schema(Arc::new(TourSchema))
            .with_schema(Arc::new(UserSchema))
            .with_schema(Arc::new(ReviewSchema))
            .with_schema(Arc::new(BookingSchema))
    }

    /// Register the schema governing a collection.
    #[must_use]
    pub fn with_schema(mut self, schema: Arc<dyn CollectionSchema>) -> Self {
        self.schemas.insert(schema.collection(), schema);
        self
    }

    fn schema(&self, collection: Collection) -> Result<&dyn CollectionSchema, StoreError> {
        self.schemas
            .get(&collection)
            .map(AsRef::as_ref)
            .ok_or_else(|| StoreError::query(format!("no schema registered for {collection}")))
    }

    fn snapshot<'a>(&'a self, data: &'a Collections) -> Snapshot<'a> {
        Snapshot {
            schemas: &self.schemas,
            data,
        }
    }

    fn assign_id(document: &mut Document) -> Result<(), StoreError> {
        let id = match document.get(ID_FIELD) {
            None | Some(Value::Null) => DocumentId::generate(),
            Some(Value::String(raw)) => raw
                .parse()
                .map_err(|_| StoreError::cast(ID_FIELD, raw.as_str()))?,
            Some(other) => return Err(StoreError::cast(ID_FIELD, other.to_string())),
        };
        document.insert(ID_FIELD.to_owned(), json!(id.to_string()));
        Ok(())
    }

    fn render(value: &Value) -> String {
        match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    fn check_unique(
        schema: &dyn CollectionSchema,
        existing: &[Document],
        candidate: &Document,
        skip: Option<DocumentId>,
    ) -> Result<(), StoreError> {
        let id = DocumentId::of(candidate);
        if skip.is_none() && existing.iter().any(|doc| DocumentId::of(doc) == id) {
            let raw = candidate.get(ID_FIELD).map(Self::render).unwrap_or_default();
            return Err(StoreError::duplicate(ID_FIELD, raw));
        }
        for key in schema.unique_keys() {
            let values: Option<Vec<&Value>> = key
                .iter()
                .map(|field| candidate.get(*field).filter(|value| !value.is_null()))
                .collect();
            let Some(values) = values else {
                continue;
            };
            let clash = existing
                .iter()
                .filter(|doc| skip.is_none_or(|skipped| DocumentId::of(doc) != Some(skipped)))
                .any(|doc| {
                    key.iter()
                        .zip(&values)
                        .all(|(field, value)| doc.get(*field) == Some(*value))
                });
            if clash {
                let rendered: Vec<String> = values.iter().map(|value| Self::render(value)).collect();
                return Err(StoreError::duplicate(key.join(", "), rendered.join(", ")));
            }
        }
        Ok(())
    }

    fn matching<'a>(
        schema: &dyn CollectionSchema,
        documents: &'a [Document],
        filter: &Filter,
    ) -> Result<Vec<&'a Document>, StoreError> {
        let compiled = CompiledFilter::compile(schema, filter)?;
        Ok(documents
            .iter()
            .filter(|doc| schema.is_visible(doc) && compiled.matches(doc))
            .collect())
    }

    fn position(
        schema: &dyn CollectionSchema,
        documents: &[Document],
        id: DocumentId,
    ) -> Option<usize> {
        documents
            .iter()
            .position(|doc| DocumentId::of(doc) == Some(id) && schema.is_visible(doc))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> Result<Document, StoreError> {
        let schema = self.schema(collection)?;
        Self::assign_id(&mut document)?;
        document.remove(VERSION_FIELD);
        schema
            .prepare(&mut document, WriteKind::Create, self.clock.utc())
            .map_err(StoreError::validation)?;
        document.insert(VERSION_FIELD.to_owned(), json!(0));

        let mut data = self.collections.write().await;
        let existing = data.get(&collection).map(Vec::as_slice).unwrap_or_default();
        Self::check_unique(schema, existing, &document, None)?;
        data.entry(collection).or_default().push(document.clone());
        debug!(%collection, id = ?DocumentId::of(&document), "document inserted");

        let snapshot = self.snapshot(&data);
        Ok(snapshot.present(
            collection,
            &document,
            &Projection::default(),
            &[],
            &[],
            POPULATE_DEPTH,
        ))
    }

    async fn find(
        &self,
        collection: Collection,
        query: &ListQuery,
        populate: &[Populate],
    ) -> Result<Vec<Document>, StoreError> {
        let schema = self.schema(collection)?;
        let data = self.collections.read().await;
        let documents = data.get(&collection).map(Vec::as_slice).unwrap_or_default();
        let mut hits = Self::matching(schema, documents, query.filter())?;
        hits.sort_by(|a, b| ordering::compare(query.sort(), a, b));
        let window: Box<dyn Iterator<Item = &Document>> = match query.pagination() {
            Some(page) => Box::new(
                hits.into_iter()
                    .skip(usize::try_from(page.skip()).unwrap_or(usize::MAX))
                    .take(usize::try_from(page.limit()).unwrap_or(usize::MAX)),
            ),
            None => Box::new(hits.into_iter()),
        };
        let snapshot = self.snapshot(&data);
        Ok(window
            .map(|doc| {
                snapshot.present(
                    collection,
                    doc,
                    query.projection(),
                    &[],
                    populate,
                    POPULATE_DEPTH,
                )
            })
            .collect())
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        let schema = self.schema(collection)?;
        let data = self.collections.read().await;
        let documents = data.get(&collection).map(Vec::as_slice).unwrap_or_default();
        let hits = Self::matching(schema, documents, filter)?;
        Ok(u64::try_from(hits.len()).unwrap_or(u64::MAX))
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
        populate: &[Populate],
    ) -> Result<Option<Document>, StoreError> {
        let schema = self.schema(collection)?;
        let data = self.collections.read().await;
        let documents = data.get(&collection).map(Vec::as_slice).unwrap_or_default();
        let snapshot = self.snapshot(&data);
        Ok(Self::position(schema, documents, id)
            .and_then(|index| documents.get(index))
            .map(|doc| {
                snapshot.present(
                    collection,
                    doc,
                    &Projection::default(),
                    &[],
                    populate,
                    POPULATE_DEPTH,
                )
            }))
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
        reveal: &[&'static str],
    ) -> Result<Option<Document>, StoreError> {
        let schema = self.schema(collection)?;
        let data = self.collections.read().await;
        let documents = data.get(&collection).map(Vec::as_slice).unwrap_or_default();
        let snapshot = self.snapshot(&data);
        Ok(Self::matching(schema, documents, filter)?
            .first()
            .map(|doc| snapshot.present(collection, doc, &Projection::default(), reveal, &[], 0)))
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
        mut patch: Document,
    ) -> Result<Option<Document>, StoreError> {
        let schema = self.schema(collection)?;
        patch.remove(ID_FIELD);
        patch.remove(VERSION_FIELD);
        let patched: Vec<String> = patch.keys().cloned().collect();

        let mut data = self.collections.write().await;
        let documents = data.get(&collection).map(Vec::as_slice).unwrap_or_default();
        let Some(index) = Self::position(schema, documents, id) else {
            return Ok(None);
        };
        let Some(current) = documents.get(index) else {
            return Ok(None);
        };
        let mut merged = current.clone();
        merged.extend(patch);
        if let Err(mut errors) = schema.prepare(
            &mut merged,
            WriteKind::Update { patched: &patched },
            self.clock.utc(),
        ) {
            errors.retain_paths(&patched);
            if !errors.is_empty() {
                return Err(StoreError::validation(errors));
            }
        }
        Self::check_unique(schema, documents, &merged, Some(id))?;
        if let Some(slot) = data.get_mut(&collection).and_then(|docs| docs.get_mut(index)) {
            *slot = merged.clone();
        }
        debug!(%collection, %id, fields = ?patched, "document updated");

        let snapshot = self.snapshot(&data);
        Ok(Some(snapshot.present(
            collection,
            &merged,
            &Projection::default(),
            &[],
            &[],
            POPULATE_DEPTH,
        )))
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> Result<Option<Document>, StoreError> {
        let schema = self.schema(collection)?;
        let mut data = self.collections.write().await;
        let Some(documents) = data.get_mut(&collection) else {
            return Ok(None);
        };
        let Some(index) = Self::position(schema, documents, id) else {
            return Ok(None);
        };
        let removed = documents.remove(index);
        debug!(%collection, %id, "document deleted");
        let snapshot = self.snapshot(&data);
        Ok(Some(snapshot.present(
            collection,
            &removed,
            &Projection::default(),
            &[],
            &[],
            0,
        )))
    }
}
