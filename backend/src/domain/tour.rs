//! Tour collection schema.
//!
//! ## Invariants
//! - `name` is unique, trimmed and 10 to 40 characters long.
//! - `priceDiscount`, when present, is strictly below `price`.
//! - `difficulty` is one of `easy`, `medium` or `difficult`.
//! - `ratingsAverage` lies in `1..=5` and is stored rounded to one decimal.
//! - Secret tours are invisible to every find.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::domain::ports::{CollectionSchema, FieldKind, Populate, WriteKind};
use crate::domain::schema_rules as rules;
use crate::domain::{Collection, Document, ValidationErrors};

/// Allowed `difficulty` values.
pub const DIFFICULTIES: [&str; 3] = ["easy", "medium", "difficult"];

/// Rating assigned to tours without reviews.
pub const DEFAULT_RATING: f64 = 4.5;

const NAME_MIN_CHARS: usize = 10;
const NAME_MAX_CHARS: usize = 40;

const GUIDES: [Populate; 1] = [Populate::reference(
    "guides",
    Collection::Users,
    "-__v -passwordChangedAt",
)];

/// Virtual population of a tour's reviews, requested on get-one.
pub const TOUR_REVIEWS: Populate =
    Populate::virtual_field("reviews", Collection::Reviews, "tour", "-__v");

/// Derive a URL slug from a tour name.
///
/// # Examples
/// ```
/// use tour_booking::domain::tour::slugify;
///
/// assert_eq!(slugify("The Forest Hiker"), "the-forest-hiker");
/// assert_eq!(slugify("  Sea & Sun!  "), "sea-sun");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Round a rating to one decimal place.
#[must_use]
pub fn round_rating(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Schema hooks for [`Collection::Tours`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TourSchema;

impl TourSchema {
    fn apply_defaults(document: &mut Document, now: DateTime<Utc>) {
        rules::set_default(document, "ratingsAverage", json!(DEFAULT_RATING));
        rules::set_default(document, "ratingsQuantity", json!(0));
        rules::set_default(document, "images", json!([]));
        rules::set_default(document, "startDates", json!([]));
        rules::set_default(document, "locations", json!([]));
        rules::set_default(document, "guides", json!([]));
        rules::set_default(document, "secretTour", json!(false));
        rules::set_created_at(document, now);
    }

    fn normalise(document: &mut Document) {
        for field in ["name", "summary", "description", "imageCover"] {
            rules::trim_text(document, field);
        }
        let slug = document.get("name").and_then(Value::as_str).map(slugify);
        if let Some(slug) = slug {
            document.insert("slug".to_owned(), json!(slug));
        }
        let rounded = document
            .get("ratingsAverage")
            .and_then(Value::as_f64)
            .map(round_rating);
        if let Some(rating) = rounded {
            document.insert("ratingsAverage".to_owned(), json!(rating));
        }
        rules::canonical_timestamp(document, "createdAt");
        rules::canonical_timestamp_list(document, "startDates");
    }

    fn validate_name(document: &Document, errors: &mut ValidationErrors) {
        let Some(name) = rules::required_text(document, "name", "A tour must have a name", errors)
        else {
            return;
        };
        let length = name.chars().count();
        if length > NAME_MAX_CHARS {
            errors.push(
                "name",
                "A tour name must have less or equal to 40 characters",
            );
        } else if length < NAME_MIN_CHARS {
            errors.push(
                "name",
                "A tour name must have more or equal to 10 characters",
            );
        }
    }

    fn validate_pricing(document: &Document, errors: &mut ValidationErrors) {
        let price = rules::required_number(document, "price", "A tour must have a price", errors);
        let discount = rules::number(document, "priceDiscount", errors);
        if let (Some(price), Some(discount), Some(raw)) =
            (price, discount, document.get("priceDiscount"))
        {
            if discount >= price {
                errors.push_across(
                    "priceDiscount",
                    &["price"],
                    format!("Discount price ({raw}) should be below regular price"),
                );
            }
        }
    }

    fn validate(document: &Document) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        Self::validate_name(document, &mut errors);
        rules::required_number(document, "duration", "A tour must have a duration", &mut errors);
        rules::required_number(
            document,
            "maxGroupSize",
            "A tour must have a group size",
            &mut errors,
        );
        if rules::required_text(
            document,
            "difficulty",
            "A tour must have a difficulty",
            &mut errors,
        )
        .is_some()
        {
            rules::one_of(
                document,
                "difficulty",
                &DIFFICULTIES,
                "Difficulty is either easy, medium or difficult",
                &mut errors,
            );
        }
        let rating = rules::number(document, "ratingsAverage", &mut errors);
        rules::range(
            rating,
            "ratingsAverage",
            (1.0, "Rating must be above 1.0"),
            (5.0, "Rating must be below 5.0"),
            &mut errors,
        );
        rules::number(document, "ratingsQuantity", &mut errors);
        Self::validate_pricing(document, &mut errors);
        rules::required_text(document, "summary", "A tour must have a description", &mut errors);
        rules::text(document, "description", &mut errors);
        rules::required_text(document, "imageCover", "A tour must have a cover image", &mut errors);
        rules::list_of(document, "images", "string", rules::is_text, &mut errors);
        rules::timestamp(document, "createdAt", &mut errors);
        rules::list_of(document, "startDates", "Date", rules::is_timestamp, &mut errors);
        rules::boolean(document, "secretTour", &mut errors);
        rules::point(document, "startLocation", &mut errors);
        rules::list_of(document, "locations", "Point", rules::is_point, &mut errors);
        rules::list_of(document, "guides", "ObjectId", rules::is_id, &mut errors);
        errors
    }
}

impl CollectionSchema for TourSchema {
    fn collection(&self) -> Collection {
        Collection::Tours
    }

    fn prepare(
        &self,
        document: &mut Document,
        write: WriteKind<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationErrors> {
        if write == WriteKind::Create {
            Self::apply_defaults(document, now);
        }
        Self::normalise(document);
        Self::validate(document).into_result()
    }

    fn unique_keys(&self) -> &'static [&'static [&'static str]] {
        &[&["name"]]
    }

    fn field_kind(&self, field: &str) -> FieldKind {
        match field {
            "duration" | "maxGroupSize" | "ratingsAverage" | "ratingsQuantity" | "price"
            | "priceDiscount" => FieldKind::Number,
            "secretTour" => FieldKind::Boolean,
            "createdAt" => FieldKind::Timestamp,
            "startDates" => FieldKind::TimestampList,
            "images" => FieldKind::TextList,
            "guides" => FieldKind::IdList,
            "startLocation" | "locations" => FieldKind::Object,
            _ => FieldKind::Text,
        }
    }

    fn hidden_fields(&self) -> &'static [&'static str] {
        &["createdAt"]
    }

    fn is_visible(&self, document: &Document) -> bool {
        document.get("secretTour").and_then(Value::as_bool) != Some(true)
    }

    fn auto_populate(&self) -> &'static [Populate] {
        &GUIDES
    }

    fn decorate(&self, document: &mut Document) {
        let weeks = document
            .get("duration")
            .and_then(Value::as_f64)
            .map(|days| days / 7.0);
        if let Some(weeks) = weeks {
            document.insert("durationWeeks".to_owned(), json!(weeks));
        }
    }
}
