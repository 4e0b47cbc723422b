//! Result ordering.
//!
//! Values of different JSON types order by type rank first: missing and
//! null, numbers, strings, objects, arrays, booleans. Sorting is stable, so
//! documents that compare equal keep insertion order.

use std::cmp::Ordering;

use api_query::{Sort, SortDirection};
use serde_json::Value;

use crate::domain::Document;

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .unwrap_or_default()
            .total_cmp(&b.as_f64().unwrap_or_default()),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(a @ (Value::Object(_) | Value::Array(_))), Some(b)) if rank(Some(a)) == rank(Some(b)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => rank(left).cmp(&rank(right)),
    }
}

/// Order two documents by `sort`.
pub(crate) fn compare(sort: &Sort, left: &Document, right: &Document) -> Ordering {
    sort.keys()
        .iter()
        .map(|key| {
            let order = compare_values(left.get(&key.field), right.get(&key.field));
            match key.direction {
                SortDirection::Ascending => order,
                SortDirection::Descending => order.reverse(),
            }
        })
        .find(|order| order.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for result ordering.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn docs(values: &[Value]) -> Vec<Document> {
        values
            .iter()
            .map(|value| value.as_object().cloned().expect("object fixture"))
            .collect()
    }

    fn names(documents: &[Document]) -> Vec<&str> {
        documents
            .iter()
            .filter_map(|doc| doc.get("name").and_then(Value::as_str))
            .collect()
    }

    #[rstest]
    fn sorts_by_multiple_keys() {
        let mut tours = docs(&[
            json!({"name": "a", "ratingsAverage": 4.5, "price": 500}),
            json!({"name": "b", "ratingsAverage": 4.9, "price": 900}),
            json!({"name": "c", "ratingsAverage": 4.5, "price": 300}),
        ]);
        let sort = Sort::parse("-ratingsAverage,price");
        tours.sort_by(|a, b| compare(&sort, a, b));
        assert_eq!(names(&tours), ["b", "c", "a"]);
    }

    #[rstest]
    fn ties_keep_insertion_order() {
        let mut tours = docs(&[
            json!({"name": "first", "price": 1}),
            json!({"name": "second", "price": 1}),
            json!({"name": "third", "price": 1}),
        ]);
        tours.sort_by(|a, b| compare(&Sort::parse("-price"), a, b));
        assert_eq!(names(&tours), ["first", "second", "third"]);
    }

    #[rstest]
    fn missing_values_sort_first_ascending() {
        let mut tours = docs(&[
            json!({"name": "priced", "price": 10}),
            json!({"name": "unpriced"}),
            json!({"name": "text", "price": "10"}),
        ]);
        tours.sort_by(|a, b| compare(&Sort::parse("price"), a, b));
        assert_eq!(names(&tours), ["unpriced", "priced", "text"]);
    }

    #[rstest]
    fn timestamps_sort_chronologically() {
        let mut tours = docs(&[
            json!({"name": "old", "createdAt": "2021-01-01T00:00:00.000Z"}),
            json!({"name": "new", "createdAt": "2024-01-01T00:00:00.000Z"}),
        ]);
        tours.sort_by(|a, b| compare(&Sort::default_order(), a, b));
        assert_eq!(names(&tours), ["new", "old"]);
    }
}
