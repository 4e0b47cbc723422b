//! Raw query-string parameters after sanitisation.

/// Keys that steer pagination, ordering and projection and are never treated
/// as filters.
pub const CONTROL_KEYS: [&str; 4] = ["page", "sort", "limit", "fields"];

/// Sanitised query-string parameters preserving first-seen key order.
///
/// ## Invariants
/// - No key contains `$` or `.`; such keys are dropped on ingestion so
///   operator expressions cannot be smuggled into the filter.
/// - Keys outside the multi-value whitelist hold exactly one value, the last
///   one supplied.
///
/// # Examples
/// ```
/// use api_query::QueryParams;
///
/// let params = QueryParams::from_pairs(
///     [("sort", "price"), ("sort", "-price"), ("difficulty", "easy"), ("difficulty", "medium")],
///     &["difficulty"],
/// );
/// assert_eq!(params.get("sort"), Some("-price"));
/// assert_eq!(params.values("difficulty"), ["easy", "medium"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    /// Build parameters from raw pairs.
    ///
    /// `multi_value_keys` lists the field names allowed to repeat; the field
    /// name is the part of the key before any `[operator]` suffix.
    pub fn from_pairs<I, K, V>(pairs: I, multi_value_keys: &[&str]) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (raw_key, raw_value) in pairs {
            let key = raw_key.into();
            if is_injection_key(&key) {
                continue;
            }
            let value = raw_value.into();
            let keeps_all = multi_value_keys.contains(&field_name(&key));
            params.push(key, value, keeps_all);
        }
        params
    }

    fn push(&mut self, key: String, value: String, keeps_all: bool) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, values)) if keeps_all => values.push(value),
            Some((_, values)) => *values = vec![value],
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Replace every value of `key` with `value`, appending the key if absent.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.push(key.into(), value.into(), false);
    }

    /// Return the last value supplied for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values(key).last().map(String::as_str)
    }

    /// Return every retained value for `key`.
    #[must_use]
    pub fn values(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    /// Iterate over keys and their retained values in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Whether no parameters survived sanitisation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_injection_key(key: &str) -> bool {
    key.contains('$') || key.contains('.')
}

pub(crate) fn field_name(key: &str) -> &str {
    key.split_once('[').map_or(key, |(field, _)| field)
}
