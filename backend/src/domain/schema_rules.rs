//! Reusable field rules for collection schemas.
//!
//! Values that are present but of the wrong type are reported the same way
//! a missing required value is, with a cast message naming the path.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::domain::{Document, DocumentId, ValidationErrors, format_timestamp, parse_timestamp};

fn cast_message(kind: &str, path: &str, value: &Value) -> String {
    format!("Cast to {kind} failed for value {value} at path \"{path}\"")
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

/// Insert `value` under `field` unless the field already holds a value.
pub(crate) fn set_default(document: &mut Document, field: &str, value: Value) {
    if document.get(field).is_none_or(Value::is_null) {
        document.insert(field.to_owned(), value);
    }
}

/// Insert the creation timestamp default.
pub(crate) fn set_created_at(document: &mut Document, now: DateTime<Utc>) {
    set_default(document, "createdAt", json!(format_timestamp(now)));
}

/// Trim surrounding whitespace of a text field.
pub(crate) fn trim_text(document: &mut Document, field: &str) {
    if let Some(Value::String(text)) = document.get_mut(field) {
        let trimmed = text.trim();
        if trimmed.len() != text.len() {
            *text = trimmed.to_owned();
        }
    }
}

/// Rewrite a timestamp field in canonical form, leaving unparsable values
/// for [`timestamp`] to report.
pub(crate) fn canonical_timestamp(document: &mut Document, field: &str) {
    if let Some(value) = document.get_mut(field) {
        canonicalise(value);
    }
}

/// Rewrite every element of a timestamp list in canonical form.
pub(crate) fn canonical_timestamp_list(document: &mut Document, field: &str) {
    if let Some(Value::Array(items)) = document.get_mut(field) {
        items.iter_mut().for_each(canonicalise);
    }
}

fn canonicalise(value: &mut Value) {
    if let Some(at) = value.as_str().and_then(parse_timestamp) {
        *value = json!(format_timestamp(at));
    }
}

/// Optional text field.
pub(crate) fn text<'a>(
    document: &'a Document,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    match document.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.as_str()),
        Some(other) => {
            errors.push(field, cast_message("string", field, other));
            None
        }
    }
}

/// Required text field; blank strings count as missing.
pub(crate) fn required_text<'a>(
    document: &'a Document,
    field: &str,
    message: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    if document.get(field).is_none_or(is_blank) {
        errors.push(field, message);
        return None;
    }
    text(document, field, errors)
}

/// Optional number field.
pub(crate) fn number(document: &Document, field: &str, errors: &mut ValidationErrors) -> Option<f64> {
    match document.get(field) {
        None | Some(Value::Null) => None,
        Some(value) => value.as_f64().or_else(|| {
            errors.push(field, cast_message("Number", field, value));
            None
        }),
    }
}

/// Required number field.
pub(crate) fn required_number(
    document: &Document,
    field: &str,
    message: &str,
    errors: &mut ValidationErrors,
) -> Option<f64> {
    if document.get(field).is_none_or(is_blank) {
        errors.push(field, message);
        return None;
    }
    number(document, field, errors)
}

/// Report a number outside `min..=max`.
pub(crate) fn range(
    value: Option<f64>,
    field: &str,
    (min, min_message): (f64, &str),
    (max, max_message): (f64, &str),
    errors: &mut ValidationErrors,
) {
    match value {
        Some(number) if number < min => errors.push(field, min_message),
        Some(number) if number > max => errors.push(field, max_message),
        _ => {}
    }
}

/// Optional boolean field.
pub(crate) fn boolean(document: &Document, field: &str, errors: &mut ValidationErrors) {
    match document.get(field) {
        None | Some(Value::Null | Value::Bool(_)) => {}
        Some(other) => errors.push(field, cast_message("Boolean", field, other)),
    }
}

/// Optional text field restricted to `allowed`.
pub(crate) fn one_of(
    document: &Document,
    field: &str,
    allowed: &[&str],
    message: &str,
    errors: &mut ValidationErrors,
) {
    if let Some(value) = text(document, field, errors) {
        if !allowed.contains(&value) {
            errors.push(field, message);
        }
    }
}

/// Optional timestamp field.
pub(crate) fn timestamp(document: &Document, field: &str, errors: &mut ValidationErrors) {
    match document.get(field) {
        None | Some(Value::Null) => {}
        Some(value) if value.as_str().and_then(parse_timestamp).is_some() => {}
        Some(other) => errors.push(field, cast_message("Date", field, other)),
    }
}

/// Required document reference.
pub(crate) fn required_id(
    document: &Document,
    field: &str,
    message: &str,
    errors: &mut ValidationErrors,
) {
    match document.get(field) {
        None | Some(Value::Null) => errors.push(field, message),
        Some(value) if value.as_str().and_then(|raw| raw.parse::<DocumentId>().ok()).is_some() => {}
        Some(other) => errors.push(field, cast_message("ObjectId", field, other)),
    }
}

/// Optional list whose elements all satisfy `accepts`.
pub(crate) fn list_of(
    document: &Document,
    field: &str,
    kind: &str,
    accepts: fn(&Value) -> bool,
    errors: &mut ValidationErrors,
) {
    match document.get(field) {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            if let Some(bad) = items.iter().find(|item| !accepts(item)) {
                errors.push(field, cast_message(kind, field, bad));
            }
        }
        Some(other) => errors.push(field, cast_message(kind, field, other)),
    }
}

/// Element check for text lists.
pub(crate) fn is_text(value: &Value) -> bool {
    value.is_string()
}

/// Element check for identifier lists.
pub(crate) fn is_id(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|raw| raw.parse::<DocumentId>().is_ok())
}

/// Element check for timestamp lists.
pub(crate) fn is_timestamp(value: &Value) -> bool {
    value.as_str().and_then(parse_timestamp).is_some()
}

/// Element check for GeoJSON points: `{type: "Point", coordinates: [lng, lat]}`.
pub(crate) fn is_point(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    let kind_ok = object
        .get("type")
        .is_none_or(|kind| kind.as_str() == Some("Point"));
    let coordinates_ok = object
        .get("coordinates")
        .is_none_or(|coordinates| point_coordinates(coordinates).is_some());
    kind_ok && coordinates_ok
}

/// Optional GeoJSON point field.
pub(crate) fn point(document: &Document, field: &str, errors: &mut ValidationErrors) {
    match document.get(field) {
        None | Some(Value::Null) => {}
        Some(value) if is_point(value) => {}
        Some(other) => errors.push(field, cast_message("Point", field, other)),
    }
}

/// Extract `[longitude, latitude]` from a GeoJSON coordinates array.
pub(crate) fn point_coordinates(value: &Value) -> Option<(f64, f64)> {
    match value.as_array()?.as_slice() {
        [lng, lat] => {
            let (lng, lat) = (lng.as_f64()?, lat.as_f64()?);
            ((-180.0..=180.0).contains(&lng) && (-90.0..=90.0).contains(&lat)).then_some((lng, lat))
        }
        _ => None,
    }
}
