//! Sequential list-query construction.

use crate::error::QueryError;
use crate::filter::{Filter, parse_filter};
use crate::pagination::Pagination;
use crate::params::QueryParams;
use crate::projection::Projection;
use crate::sort::Sort;

/// Immutable description of a list request.
///
/// A query without a page window returns every matching record; this is
/// used for internal lookups such as aggregate recomputation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    filter: Filter,
    sort: Sort,
    projection: Projection,
    pagination: Option<Pagination>,
}

impl ListQuery {
    /// Query returning every record matching `filter` in default order.
    #[must_use]
    pub fn matching(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Replace the sort order.
    #[must_use]
    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Conditions every returned record satisfies.
    #[must_use]
    pub const fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Result ordering.
    #[must_use]
    pub const fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Returned fields.
    #[must_use]
    pub const fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Page window, if the query is paginated.
    #[must_use]
    pub const fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }
}

/// Applies query-string parameters to a base filter, one stage at a time.
///
/// Stages may be skipped; skipped stages keep the defaults of
/// [`ListQuery::matching`]. Stages never touch storage.
///
/// # Examples
/// ```
/// use api_query::{Filter, ListQueryBuilder, QueryParams, SortDirection};
///
/// let params = QueryParams::from_pairs([("rating", "5")], &[]);
/// let query = ListQueryBuilder::new(params)
///     .with_base_filter(Filter::by("tour", "abc"))
///     .filter()
///     .expect("plain equality")
///     .sort()
///     .build();
///
/// assert_eq!(query.filter().conditions().len(), 2);
/// let key = query.sort().keys().first().expect("default sort");
/// assert_eq!(key.direction, SortDirection::Descending);
/// ```
#[derive(Debug, Clone)]
pub struct ListQueryBuilder {
    params: QueryParams,
    query: ListQuery,
}

impl ListQueryBuilder {
    /// Start from sanitised parameters and a match-everything filter.
    #[must_use]
    pub fn new(params: QueryParams) -> Self {
        Self {
            params,
            query: ListQuery::default(),
        }
    }

    /// Restrict every result to `base`, e.g. reviews of one tour.
    #[must_use]
    pub fn with_base_filter(mut self, base: Filter) -> Self {
        self.query.filter = base;
        self
    }

    /// Translate non-control keys into conditions.
    ///
    /// # Errors
    /// Returns [`QueryError`] when a key carries an unsupported or malformed
    /// operator suffix.
    pub fn filter(mut self) -> Result<Self, QueryError> {
        let parsed = parse_filter(&self.params)?;
        self.query.filter.extend(parsed);
        Ok(self)
    }

    /// Apply the `sort` parameter or the default order.
    #[must_use]
    pub fn sort(mut self) -> Self {
        self.query.sort = self
            .params
            .get("sort")
            .map_or_else(Sort::default_order, Sort::parse);
        self
    }

    /// Apply the `fields` parameter or the default projection.
    #[must_use]
    pub fn limit_fields(mut self) -> Self {
        self.query.projection = self
            .params
            .get("fields")
            .map_or_else(Projection::default, Projection::parse);
        self
    }

    /// Apply the `page` and `limit` parameters.
    #[must_use]
    pub fn paginate(mut self) -> Self {
        self.query.pagination = Some(Pagination::from_raw(
            self.params.get("page"),
            self.params.get("limit"),
        ));
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> ListQuery {
        self.query
    }
}
