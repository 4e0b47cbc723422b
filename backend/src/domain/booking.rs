//! Booking collection schema.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::ports::{CollectionSchema, FieldKind, Populate, WriteKind};
use crate::domain::schema_rules as rules;
use crate::domain::{Collection, Document, ValidationErrors};

const PARTIES: [Populate; 2] = [
    Populate::reference("user", Collection::Users, "-__v"),
    Populate::reference("tour", Collection::Tours, "name"),
];

/// Schema hooks for [`Collection::Bookings`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingSchema;

impl CollectionSchema for BookingSchema {
    fn collection(&self) -> Collection {
        Collection::Bookings
    }

    fn prepare(
        &self,
        document: &mut Document,
        write: WriteKind<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationErrors> {
        if write == WriteKind::Create {
            rules::set_created_at(document, now);
            rules::set_default(document, "paid", json!(true));
        }
        rules::canonical_timestamp(document, "createdAt");

        let mut errors = ValidationErrors::default();
        rules::required_id(document, "tour", "Booking must belong to a Tour!", &mut errors);
        rules::required_id(document, "user", "Booking must belong to a User!", &mut errors);
        rules::required_number(document, "price", "Booking must have a price.", &mut errors);
        rules::timestamp(document, "createdAt", &mut errors);
        rules::boolean(document, "paid", &mut errors);
        errors.into_result()
    }

    fn field_kind(&self, field: &str) -> FieldKind {
        match field {
            "price" => FieldKind::Number,
            "paid" => FieldKind::Boolean,
            "createdAt" => FieldKind::Timestamp,
            "tour" | "user" => FieldKind::Id,
            _ => FieldKind::Text,
        }
    }

    fn auto_populate(&self) -> &'static [Populate] {
        &PARTIES
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for booking validation.
    use super::*;
    use crate::domain::DocumentId;
    use rstest::rstest;

    #[rstest]
    fn create_defaults_to_paid() {
        let mut booking = json!({
            "tour": DocumentId::generate().to_string(),
            "user": DocumentId::generate().to_string(),
            "price": 497,
        })
        .as_object()
        .cloned()
        .expect("object fixture");
        BookingSchema
            .prepare(&mut booking, WriteKind::Create, Utc::now())
            .expect("valid booking");
        assert_eq!(booking.get("paid"), Some(&json!(true)));
        assert!(booking.contains_key("createdAt"));
    }

    #[rstest]
    #[case(json!({}), "Booking must belong to a Tour!. Booking must belong to a User!. Booking must have a price.")]
    #[case(
        json!({"tour": "not-an-id", "user": DocumentId::generate().to_string(), "price": 10}),
        "Cast to ObjectId failed for value \"not-an-id\" at path \"tour\""
    )]
    fn incomplete_bookings_are_rejected(#[case] value: serde_json::Value, #[case] message: &str) {
        let mut booking = value.as_object().cloned().expect("object fixture");
        let errors = BookingSchema
            .prepare(&mut booking, WriteKind::Create, Utc::now())
            .expect_err("invalid booking");
        assert_eq!(errors.to_string(), message);
    }
}
