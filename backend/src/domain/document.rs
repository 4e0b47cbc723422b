//! Schemaless document primitives shared by every collection.
//!
//! Documents are JSON objects. The store owns two reserved fields: `_id`
//! (a UUID string assigned on insert) and `__v` (the document version, zero
//! on insert and never returned to clients).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub use api_query::VERSION_FIELD;

/// JSON object stored in a collection.
pub type Document = Map<String, Value>;

/// Reserved identifier field.
pub const ID_FIELD: &str = "_id";

/// Identifier of a stored document.
///
/// # Examples
/// ```
/// use tour_booking::domain::DocumentId;
///
/// let id: DocumentId = "5c88fa8c-f4af-4a39-9709-c2955c88fa8c".parse().expect("uuid");
/// assert_eq!(id.to_string(), "5c88fa8c-f4af-4a39-9709-c2955c88fa8c");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Allocate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Read the identifier of `document`, if it carries a valid one.
    #[must_use]
    pub fn of(document: &Document) -> Option<Self> {
        document
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// Named document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Bookable tours.
    Tours,
    /// Registered accounts.
    Users,
    /// Tour reviews written by users.
    Reviews,
    /// Paid tour reservations.
    Bookings,
}

impl Collection {
    /// Storage name of the collection.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tours => "tours",
            Self::Users => "users",
            Self::Reviews => "reviews",
            Self::Bookings => "bookings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Render a timestamp the way documents store it: RFC 3339, UTC,
/// millisecond precision.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .map(|at| at.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for document primitives.
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn reads_identifier_from_document() {
        let id = DocumentId::generate();
        let mut document = Document::new();
        document.insert(ID_FIELD.to_owned(), json!(id.to_string()));
        assert_eq!(DocumentId::of(&document), Some(id));
    }

    #[rstest]
    #[case(json!({"_id": "nope"}))]
    #[case(json!({"_id": 5}))]
    #[case(json!({}))]
    fn invalid_identifiers_are_absent(#[case] value: Value) {
        let document = value.as_object().cloned().expect("object fixture");
        assert!(DocumentId::of(&document).is_none());
    }

    #[rstest]
    fn timestamps_render_with_millis() {
        let at = Utc.with_ymd_and_hms(2021, 4, 25, 9, 0, 0).single().expect("valid date");
        assert_eq!(format_timestamp(at), "2021-04-25T09:00:00.000Z");
    }

    #[rstest]
    #[case("2021-06-19T09:00:00.000Z")]
    #[case("2021-06-19T09:00:00Z")]
    #[case("2021-06-19")]
    fn parses_supported_timestamp_shapes(#[case] raw: &str) {
        let parsed = parse_timestamp(raw).expect("timestamp parses");
        assert_eq!(parsed.format("%Y-%m-%d").to_string(), "2021-06-19");
    }
}
