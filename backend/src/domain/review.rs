//! Review collection schema.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::ports::{CollectionSchema, FieldKind, Populate, WriteKind};
use crate::domain::schema_rules as rules;
use crate::domain::{Collection, Document, ValidationErrors};

const AUTHOR: [Populate; 1] = [Populate::reference("user", Collection::Users, "name photo")];

/// Schema hooks for [`Collection::Reviews`].
///
/// A user may review a given tour at most once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewSchema;

impl CollectionSchema for ReviewSchema {
    fn collection(&self) -> Collection {
        Collection::Reviews
    }

    fn prepare(
        &self,
        document: &mut Document,
        write: WriteKind<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationErrors> {
        if write == WriteKind::Create {
            rules::set_created_at(document, now);
        }
        rules::trim_text(document, "review");
        rules::canonical_timestamp(document, "createdAt");

        let mut errors = ValidationErrors::default();
        rules::required_text(document, "review", "Review can not be empty!", &mut errors);
        let rating = rules::number(document, "rating", &mut errors);
        rules::range(
            rating,
            "rating",
            (1.0, "Rating must be above 1.0"),
            (5.0, "Rating must be below 5.0"),
            &mut errors,
        );
        rules::timestamp(document, "createdAt", &mut errors);
        rules::required_id(document, "tour", "Review must belong to a tour.", &mut errors);
        rules::required_id(document, "user", "Review must belong to a user", &mut errors);
        errors.into_result()
    }

    fn unique_keys(&self) -> &'static [&'static [&'static str]] {
        &[&["tour", "user"]]
    }

    fn field_kind(&self, field: &str) -> FieldKind {
        match field {
            "rating" => FieldKind::Number,
            "createdAt" => FieldKind::Timestamp,
            "tour" | "user" => FieldKind::Id,
            _ => FieldKind::Text,
        }
    }

    fn auto_populate(&self) -> &'static [Populate] {
        &AUTHOR
    }
}

/// Read the tour a review belongs to.
#[must_use]
pub fn reviewed_tour(review: &Document) -> Option<crate::domain::DocumentId> {
    review
        .get("tour")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok())
}
