//! Field-level validation results collected by collection schemas.

use std::fmt;

use serde_json::{Value, json};

/// A broken constraint on one document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Top-level field the constraint applies to.
    pub path: String,
    /// Other fields the constraint compares `path` against.
    pub related: Vec<String>,
    /// Message shown to clients.
    pub message: String,
}

/// Ordered collection of field violations.
///
/// Displays as the messages joined with `". "`, which is the message clients
/// see for a failed write.
///
/// # Examples
/// ```
/// use tour_booking::domain::ValidationErrors;
///
/// let mut errors = ValidationErrors::default();
/// errors.push("name", "A tour must have a name");
/// errors.push("price", "A tour must have a price");
/// assert_eq!(errors.to_string(), "A tour must have a name. A tour must have a price");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    /// Record a violation.
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            path: path.into(),
            related: Vec::new(),
            message: message.into(),
        });
    }

    /// Record a violation of a constraint spanning `path` and `related`.
    ///
    /// The violation survives [`retain_paths`](Self::retain_paths) when any
    /// of the involved fields was patched.
    pub fn push_across(
        &mut self,
        path: impl Into<String>,
        related: &[&str],
        message: impl Into<String>,
    ) {
        self.violations.push(FieldViolation {
            path: path.into(),
            related: related.iter().map(|field| (*field).to_owned()).collect(),
            message: message.into(),
        });
    }

    /// Whether no violation was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Recorded violations in insertion order.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Drop violations on paths a partial update did not touch.
    pub fn retain_paths(&mut self, paths: &[String]) {
        self.violations.retain(|violation| {
            paths.iter().any(|path| {
                *path == violation.path || violation.related.iter().any(|field| field == path)
            })
        });
    }

    /// Convert into a `Result`, failing when any violation was recorded.
    ///
    /// # Errors
    /// Returns `self` when it holds at least one violation.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Structured per-field details for error payloads.
    #[must_use]
    pub fn to_details(&self) -> Value {
        let fields: Vec<Value> = self
            .violations
            .iter()
            .map(|violation| json!({ "field": violation.path, "message": violation.message }))
            .collect();
        json!({ "fields": fields })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self
            .violations
            .iter()
            .map(|violation| violation.message.as_str())
            .collect();
        f.write_str(&messages.join(". "))
    }
}
