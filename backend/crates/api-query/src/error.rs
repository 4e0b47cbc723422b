//! Errors raised while shaping a list query.

use thiserror::Error;

/// Failures produced by the query builder.
///
/// Every variant describes a problem with the caller's input; none of them
/// indicate a fault in the builder itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A bracketed operator suffix is not one of `gt`, `gte`, `lt` or `lte`.
    #[error("Unsupported filter operator `{operator}` on field `{field}`")]
    UnsupportedOperator {
        /// Field the operator was attached to.
        field: String,
        /// Operator text found between the brackets.
        operator: String,
    },
    /// A filter key could not be split into a field and an operator.
    #[error("Malformed filter key `{key}`")]
    MalformedKey {
        /// Raw key as it appeared in the query string.
        key: String,
    },
    /// The requested page starts beyond the last matching record.
    #[error("This page does not exist")]
    PageNotFound {
        /// Requested one-based page number.
        page: u64,
        /// Number of records matching the filter.
        total: u64,
    },
}
