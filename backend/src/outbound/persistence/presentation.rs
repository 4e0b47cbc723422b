//! Shaping stored documents for callers: projection, hidden fields,
//! population of related documents and computed fields.

use std::collections::HashMap;
use std::sync::Arc;

use api_query::Projection;
use serde_json::Value;

use crate::domain::ports::{CollectionSchema, Populate, PopulateLink};
use crate::domain::{Collection, Document, DocumentId, ID_FIELD, VERSION_FIELD};

/// Nested population levels followed from a top-level document.
pub(crate) const POPULATE_DEPTH: u8 = 2;

/// Read-only view of every collection, used while presenting results.
pub(crate) struct Snapshot<'a> {
    pub(crate) schemas: &'a HashMap<Collection, Arc<dyn CollectionSchema>>,
    pub(crate) data: &'a HashMap<Collection, Vec<Document>>,
}

impl Snapshot<'_> {
    fn visible(&self, collection: Collection) -> impl Iterator<Item = &Document> {
        let schema = self.schemas.get(&collection);
        self.data
            .get(&collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(move |document| schema.is_some_and(|schema| schema.is_visible(document)))
    }

    fn lookup(&self, collection: Collection, id: &str) -> Option<&Document> {
        let id: DocumentId = id.parse().ok()?;
        self.visible(collection)
            .find(|document| DocumentId::of(document) == Some(id))
    }

    /// Present `document` from `collection`: apply `projection` and hidden
    /// fields, run `extra` plus the schema's automatic populations and add
    /// computed fields.
    pub(crate) fn present(
        &self,
        collection: Collection,
        document: &Document,
        projection: &Projection,
        reveal: &[&str],
        extra: &[Populate],
        depth: u8,
    ) -> Document {
        let Some(schema) = self.schemas.get(&collection) else {
            return document.clone();
        };
        let hidden = schema.hidden_fields();
        let mut shaped: Document = document
            .iter()
            .filter(|(field, _)| field.as_str() != VERSION_FIELD)
            .filter(|(field, _)| {
                reveal.contains(&field.as_str())
                    || (projection.admits(field)
                        && (!hidden.contains(&field.as_str())
                            || projection.explicitly_includes(field)))
            })
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        if depth > 0 {
            for directive in schema.auto_populate().iter().chain(extra) {
                self.populate(&mut shaped, directive, depth);
            }
        }
        schema.decorate(&mut shaped);
        shaped
    }

    fn related(&self, directive: &Populate, document: &Document, depth: u8) -> Document {
        self.present(
            directive.collection,
            document,
            &Projection::parse(directive.select),
            &[],
            &[],
            depth - 1,
        )
    }

    fn populate(&self, shaped: &mut Document, directive: &Populate, depth: u8) {
        match directive.link {
            PopulateLink::Reference => {
                let Some(value) = shaped.get_mut(directive.path) else {
                    return;
                };
                match value {
                    Value::String(id) => {
                        *value = self
                            .lookup(directive.collection, id)
                            .map_or(Value::Null, |found| {
                                Value::Object(self.related(directive, found, depth))
                            });
                    }
                    Value::Array(items) => {
                        *items = items
                            .iter()
                            .filter_map(Value::as_str)
                            .filter_map(|id| self.lookup(directive.collection, id))
                            .map(|found| Value::Object(self.related(directive, found, depth)))
                            .collect();
                    }
                    _ => {}
                }
            }
            PopulateLink::Virtual { foreign_field } => {
                let Some(id) = shaped.get(ID_FIELD).and_then(Value::as_str).map(str::to_owned)
                else {
                    return;
                };
                let related: Vec<Value> = self
                    .visible(directive.collection)
                    .filter(|candidate| {
                        candidate.get(foreign_field).and_then(Value::as_str) == Some(id.as_str())
                    })
                    .map(|found| Value::Object(self.related(directive, found, depth)))
                    .collect();
                shaped.insert(directive.path.to_owned(), Value::Array(related));
            }
        }
    }
}
