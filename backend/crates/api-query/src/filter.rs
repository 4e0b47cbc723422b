//! Filter conditions derived from query-string keys.

use crate::error::QueryError;
use crate::params::{CONTROL_KEYS, QueryParams, field_name};

/// Comparison applied by a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// Field equals the value.
    Eq,
    /// Field is strictly greater than the value.
    Gt,
    /// Field is greater than or equal to the value.
    Gte,
    /// Field is strictly less than the value.
    Lt,
    /// Field is less than or equal to the value.
    Lte,
    /// Field equals one of the values.
    In,
}

impl ComparisonOp {
    /// Parse a bracketed query-string suffix such as `gte`.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }
}

/// Raw, untyped operand of a condition.
///
/// Values stay textual; the persistence adapter casts them according to the
/// target field's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// A single operand.
    Single(String),
    /// A membership set.
    Many(Vec<String>),
}

impl FilterValue {
    /// Iterate over every operand.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        };
        values.iter().map(String::as_str)
    }
}

/// One predicate over a top-level document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Field name.
    pub field: String,
    /// Comparison to apply.
    pub op: ComparisonOp,
    /// Operand.
    pub value: FilterValue,
}

impl Condition {
    /// Equality condition.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: ComparisonOp::Eq,
            value: FilterValue::Single(value.into()),
        }
    }
}

/// Conjunction of conditions; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Filter that matches every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter with a single equality condition.
    ///
    /// # Examples
    /// ```
    /// use api_query::Filter;
    ///
    /// let filter = Filter::by("tour", "5c88fa8cf4afda39709c2955");
    /// assert_eq!(filter.conditions().len(), 1);
    /// ```
    pub fn by(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::all().and(Condition::eq(field, value))
    }

    /// Add a condition to the conjunction.
    #[must_use]
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Append every condition of `other`.
    pub fn extend(&mut self, other: Self) {
        self.conditions.extend(other.conditions);
    }

    /// Conditions in application order.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

pub(crate) fn parse_filter(params: &QueryParams) -> Result<Filter, QueryError> {
    let mut filter = Filter::all();
    for (key, values) in params.iter() {
        if CONTROL_KEYS.contains(&key) {
            continue;
        }
        if let Some(condition) = parse_condition(key, values)? {
            filter = filter.and(condition);
        }
    }
    Ok(filter)
}

fn parse_condition(key: &str, values: &[String]) -> Result<Option<Condition>, QueryError> {
    let field = field_name(key);
    if field.is_empty() {
        return Err(QueryError::MalformedKey {
            key: key.to_owned(),
        });
    }
    let Some(last) = values.last() else {
        return Ok(None);
    };

    let op = match key.get(field.len()..) {
        None | Some("") => ComparisonOp::Eq,
        Some(suffix) => {
            let operator = suffix
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .ok_or_else(|| QueryError::MalformedKey {
                    key: key.to_owned(),
                })?;
            ComparisonOp::from_suffix(operator).ok_or_else(|| {
                QueryError::UnsupportedOperator {
                    field: field.to_owned(),
                    operator: operator.to_owned(),
                }
            })?
        }
    };

    let condition = match (op, values) {
        (ComparisonOp::Eq, [_, _, ..]) => Condition {
            field: field.to_owned(),
            op: ComparisonOp::In,
            value: FilterValue::Many(values.to_vec()),
        },
        _ => Condition {
            field: field.to_owned(),
            op,
            value: FilterValue::Single(last.clone()),
        },
    };
    Ok(Some(condition))
}
