//! Sort order parsing.

/// Order applied when the caller does not request one: newest first.
pub const DEFAULT_SORT: &str = "-createdAt";

/// Direction of a single sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest values first.
    Ascending,
    /// Largest values first.
    Descending,
}

/// Field and direction pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Field to order by.
    pub field: String,
    /// Ordering direction.
    pub direction: SortDirection,
}

/// Ordered list of sort keys; earlier keys take precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    keys: Vec<SortKey>,
}

impl Sort {
    /// Parse a comma- or space-separated field list where a leading `-`
    /// marks descending order.
    ///
    /// Falls back to [`DEFAULT_SORT`] when the list holds no field names.
    ///
    /// # Examples
    /// ```
    /// use api_query::{Sort, SortDirection};
    ///
    /// let sort = Sort::parse("-ratingsAverage,price");
    /// let first = sort.keys().first().expect("first key");
    /// assert_eq!(first.field, "ratingsAverage");
    /// assert_eq!(first.direction, SortDirection::Descending);
    /// ```
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let keys: Vec<SortKey> = spec
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter_map(parse_key)
            .collect();
        if keys.is_empty() {
            Self::default_order()
        } else {
            Self { keys }
        }
    }

    /// The fallback order, newest documents first.
    #[must_use]
    pub fn default_order() -> Self {
        Self {
            keys: DEFAULT_SORT.split(',').filter_map(parse_key).collect(),
        }
    }

    /// Sort keys by precedence.
    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::default_order()
    }
}

fn parse_key(raw: &str) -> Option<SortKey> {
    let trimmed = raw.trim();
    let (field, direction) = match trimmed.strip_prefix('-') {
        Some(field) => (field, SortDirection::Descending),
        None => (trimmed, SortDirection::Ascending),
    };
    if field.is_empty() {
        return None;
    }
    Some(SortKey {
        field: field.to_owned(),
        direction,
    })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for sort parsing.
    use super::*;
    use rstest::rstest;

    fn fields(sort: &Sort) -> Vec<(&str, SortDirection)> {
        sort.keys()
            .iter()
            .map(|key| (key.field.as_str(), key.direction))
            .collect()
    }

    #[rstest]
    #[case("price,-ratingsAverage")]
    #[case("price -ratingsAverage")]
    #[case(" price , -ratingsAverage ")]
    fn separators_are_interchangeable(#[case] spec: &str) {
        assert_eq!(
            fields(&Sort::parse(spec)),
            [
                ("price", SortDirection::Ascending),
                ("ratingsAverage", SortDirection::Descending)
            ]
        );
    }

    #[rstest]
    #[case("")]
    #[case(",")]
    #[case("-")]
    fn empty_specs_fall_back_to_newest_first(#[case] spec: &str) {
        assert_eq!(
            fields(&Sort::parse(spec)),
            [("createdAt", SortDirection::Descending)]
        );
    }
}
