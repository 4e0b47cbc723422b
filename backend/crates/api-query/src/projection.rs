//! Field projection parsing.

/// Internal document version field; never returned to clients.
pub const VERSION_FIELD: &str = "__v";

const ID_FIELD: &str = "_id";

/// Top-level fields to return.
///
/// ## Invariants
/// - [`VERSION_FIELD`] is never admitted.
/// - An inclusion projection always admits the `_id` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Return only the listed fields.
    Include(Vec<String>),
    /// Return every field except the listed ones.
    Exclude(Vec<String>),
}

impl Projection {
    /// Parse a comma- or space-separated field list.
    ///
    /// Plain names build an inclusion list. When every name carries a `-`
    /// prefix the list excludes them instead. Mixed lists keep only the
    /// inclusions. An empty list yields [`Projection::default`].
    ///
    /// # Examples
    /// ```
    /// use api_query::Projection;
    ///
    /// let projection = Projection::parse("name,price");
    /// assert!(projection.admits("name"));
    /// assert!(projection.admits("_id"));
    /// assert!(!projection.admits("summary"));
    /// assert!(!projection.admits("__v"));
    /// ```
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let mut included = Vec::new();
        let mut excluded = Vec::new();
        for raw in spec.split(|c: char| c == ',' || c.is_whitespace()) {
            let name = raw.trim();
            match name.strip_prefix('-') {
                Some("") => {}
                Some(field) => excluded.push(field.to_owned()),
                None if name.is_empty() => {}
                None => included.push(name.to_owned()),
            }
        }

        if !included.is_empty() {
            included.retain(|field| field != VERSION_FIELD);
            return Self::Include(included);
        }
        if excluded.is_empty() {
            return Self::default();
        }
        if !excluded.iter().any(|field| field == VERSION_FIELD) {
            excluded.push(VERSION_FIELD.to_owned());
        }
        Self::Exclude(excluded)
    }

    /// Whether `field` appears in the output.
    #[must_use]
    pub fn admits(&self, field: &str) -> bool {
        if field == VERSION_FIELD {
            return false;
        }
        match self {
            Self::Include(fields) => field == ID_FIELD || fields.iter().any(|f| f == field),
            Self::Exclude(fields) => !fields.iter().any(|f| f == field),
        }
    }

    /// Whether `field` was named in an inclusion list.
    ///
    /// Fields hidden by default are only returned when requested this way.
    #[must_use]
    pub fn explicitly_includes(&self, field: &str) -> bool {
        matches!(self, Self::Include(fields) if fields.iter().any(|f| f == field))
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::Exclude(vec![VERSION_FIELD.to_owned()])
    }
}
