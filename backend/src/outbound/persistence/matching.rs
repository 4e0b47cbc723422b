//! Filter evaluation against stored documents.
//!
//! Filter operands arrive as text; they are cast to the storage type of the
//! target field before comparing. A missing or null field never matches.

use std::cmp::Ordering;

use api_query::{ComparisonOp, Condition, Filter};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::ports::{CollectionSchema, FieldKind, StoreError};
use crate::domain::{Document, DocumentId, ID_FIELD, parse_timestamp};

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Text(String),
    Number(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Id(DocumentId),
}

fn kind_of(schema: &dyn CollectionSchema, field: &str) -> FieldKind {
    if field == ID_FIELD {
        FieldKind::Id
    } else {
        schema.field_kind(field)
    }
}

fn cast(kind: FieldKind, field: &str, raw: &str) -> Result<Operand, StoreError> {
    let failed = || StoreError::cast(field, raw);
    match kind {
        FieldKind::Text | FieldKind::TextList => Ok(Operand::Text(raw.to_owned())),
        FieldKind::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .map(Operand::Number)
            .ok_or_else(failed),
        FieldKind::Boolean => match raw.trim() {
            "true" => Ok(Operand::Boolean(true)),
            "false" => Ok(Operand::Boolean(false)),
            _ => Err(failed()),
        },
        FieldKind::Timestamp | FieldKind::TimestampList => parse_timestamp(raw)
            .map(Operand::Timestamp)
            .ok_or_else(failed),
        FieldKind::Id | FieldKind::IdList => raw.parse().map(Operand::Id).map_err(|_| failed()),
        FieldKind::Object => Err(failed()),
    }
}

fn compare(stored: &Value, operand: &Operand) -> Option<Ordering> {
    match operand {
        Operand::Text(text) => stored.as_str().map(|value| value.cmp(text.as_str())),
        Operand::Number(number) => stored.as_f64().and_then(|value| value.partial_cmp(number)),
        Operand::Boolean(flag) => stored.as_bool().map(|value| value.cmp(flag)),
        Operand::Timestamp(at) => stored
            .as_str()
            .and_then(parse_timestamp)
            .map(|value| value.cmp(at)),
        Operand::Id(id) => stored
            .as_str()
            .and_then(|raw| raw.parse::<DocumentId>().ok())
            .map(|value| value.cmp(id)),
    }
}

fn holds(op: ComparisonOp, ordering: Option<Ordering>) -> bool {
    match (op, ordering) {
        (_, None) => false,
        (ComparisonOp::Eq | ComparisonOp::In, Some(order)) => order == Ordering::Equal,
        (ComparisonOp::Gt, Some(order)) => order == Ordering::Greater,
        (ComparisonOp::Gte, Some(order)) => order != Ordering::Less,
        (ComparisonOp::Lt, Some(order)) => order == Ordering::Less,
        (ComparisonOp::Lte, Some(order)) => order != Ordering::Greater,
    }
}

fn is_list(kind: FieldKind) -> bool {
    matches!(
        kind,
        FieldKind::TextList | FieldKind::TimestampList | FieldKind::IdList
    )
}

/// A condition with its operands cast to the field's storage type.
struct CastCondition<'a> {
    field: &'a str,
    op: ComparisonOp,
    list: bool,
    operands: Vec<Operand>,
}

impl CastCondition<'_> {
    fn accepts(&self, stored: &Value) -> bool {
        self.operands
            .iter()
            .any(|operand| holds(self.op, compare(stored, operand)))
    }

    fn matches(&self, document: &Document) -> bool {
        match document.get(self.field) {
            None | Some(Value::Null) => false,
            Some(Value::Array(items)) if self.list => items.iter().any(|item| self.accepts(item)),
            Some(stored) => self.accepts(stored),
        }
    }
}

/// A filter compiled against one collection schema.
pub(crate) struct CompiledFilter<'a> {
    conditions: Vec<CastCondition<'a>>,
}

impl<'a> CompiledFilter<'a> {
    /// Cast every operand of `filter`.
    ///
    /// # Errors
    /// Returns [`StoreError::Cast`] naming the first operand that does not fit
    /// its field.
    pub(crate) fn compile(
        schema: &dyn CollectionSchema,
        filter: &'a Filter,
    ) -> Result<Self, StoreError> {
        let conditions = filter
            .conditions()
            .iter()
            .map(|condition: &'a Condition| {
                let kind = kind_of(schema, &condition.field);
                let operands = condition
                    .value
                    .iter()
                    .map(|raw| cast(kind, &condition.field, raw))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CastCondition {
                    field: condition.field.as_str(),
                    op: condition.op,
                    list: is_list(kind),
                    operands,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(Self { conditions })
    }

    /// Whether `document` satisfies every condition.
    pub(crate) fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.matches(document))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for filter evaluation.
    use super::*;
    use crate::domain::{TourSchema, UserSchema};
    use api_query::{FilterValue, QueryParams};
    use rstest::rstest;
    use serde_json::json;

    fn tour() -> Document {
        json!({
            "_id": "5c88fa8c-f4af-4a39-9709-c2955c88fa8c",
            "name": "The Forest Hiker",
            "difficulty": "easy",
            "price": 397,
            "duration": 5,
            "secretTour": false,
            "startDates": ["2021-04-25T09:00:00.000Z", "2021-07-20T09:00:00.000Z"],
            "guides": ["5c8a22c62f8fb814b56fa18b"],
        })
        .as_object()
        .cloned()
        .expect("object fixture")
    }

    fn filter_of(pairs: &[(&str, &str)]) -> Filter {
        let params = QueryParams::from_pairs(pairs.iter().copied(), &["difficulty", "price"]);
        api_query::ListQueryBuilder::new(params)
            .filter()
            .expect("valid filter")
            .build()
            .filter()
            .clone()
    }

    #[rstest]
    #[case(&[("price[lt]", "400")], true)]
    #[case(&[("price[gte]", "397"), ("duration", "5")], true)]
    #[case(&[("price[gt]", "397")], false)]
    #[case(&[("difficulty", "easy"), ("difficulty", "medium")], true)]
    #[case(&[("difficulty", "difficult")], false)]
    #[case(&[("secretTour", "false")], true)]
    #[case(&[("startDates[gte]", "2021-07-01")], true)]
    #[case(&[("startDates[lt]", "2021-01-01")], false)]
    #[case(&[("summary", "anything")], false)]
    #[case(&[("_id", "5c88fa8c-f4af-4a39-9709-c2955c88fa8c")], true)]
    fn evaluates_conditions(#[case] pairs: &[(&str, &str)], #[case] expected: bool) {
        let filter = filter_of(pairs);
        let compiled = CompiledFilter::compile(&TourSchema, &filter).expect("compiles");
        assert_eq!(compiled.matches(&tour()), expected);
    }

    #[rstest]
    #[case("price", "cheap", "Invalid price: cheap.")]
    #[case("_id", "wwwwww", "Invalid _id: wwwwww.")]
    #[case("secretTour", "maybe", "Invalid secretTour: maybe.")]
    fn rejects_operands_that_do_not_fit(
        #[case] field: &str,
        #[case] raw: &str,
        #[case] message: &str,
    ) {
        let filter = Filter::by(field, raw);
        let err = CompiledFilter::compile(&TourSchema, &filter)
            .err()
            .expect("cast failure");
        assert_eq!(crate::domain::Error::from(err).message(), message);
    }

    #[rstest]
    fn membership_accepts_any_listed_value() {
        let filter = Filter::all().and(Condition {
            field: "role".to_owned(),
            op: ComparisonOp::In,
            value: FilterValue::Many(vec!["admin".to_owned(), "guide".to_owned()]),
        });
        let compiled = CompiledFilter::compile(&UserSchema, &filter).expect("compiles");
        let guide = json!({"role": "guide"}).as_object().cloned().expect("object");
        let user = json!({"role": "user"}).as_object().cloned().expect("object");
        assert!(compiled.matches(&guide));
        assert!(!compiled.matches(&user));
    }
}
