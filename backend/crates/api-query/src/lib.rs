//! Translate list-endpoint query strings into structured list requests.
//!
//! This crate turns the raw key/value pairs of a query string into a
//! [`ListQuery`]: a filter, a sort order, a field projection and a page
//! window. It is independent of any storage engine and of the backend domain
//! types; persistence adapters interpret the resulting value.
//!
//! # Overview
//!
//! - [`QueryParams`] ingests raw pairs, dropping operator-injection keys and
//!   collapsing repeated keys unless they are whitelisted.
//! - [`ListQueryBuilder`] applies filtering, sorting, field limiting and
//!   pagination in that order on top of a base filter.
//! - [`Pagination::ensure_within`] reports requests for pages past the end of
//!   the result set.
//!
//! # Example
//!
//! ```
//! use api_query::{ComparisonOp, ListQueryBuilder, QueryParams};
//!
//! let params = QueryParams::from_pairs(
//!     [("price[lt]", "500"), ("sort", "-price"), ("page", "2"), ("limit", "3")],
//!     &[],
//! );
//! let query = ListQueryBuilder::new(params)
//!     .filter()
//!     .expect("supported operators")
//!     .sort()
//!     .limit_fields()
//!     .paginate()
//!     .build();
//!
//! let condition = query.filter().conditions().first().expect("one condition");
//! assert_eq!(condition.field, "price");
//! assert_eq!(condition.op, ComparisonOp::Lt);
//! assert_eq!(query.pagination().map(|window| window.skip()), Some(3));
//! ```

mod builder;
mod error;
mod filter;
mod pagination;
mod params;
mod projection;
mod sort;

pub use builder::{ListQuery, ListQueryBuilder};
pub use error::QueryError;
pub use filter::{ComparisonOp, Condition, Filter, FilterValue};
pub use pagination::{DEFAULT_LIMIT, DEFAULT_PAGE, Pagination};
pub use params::{CONTROL_KEYS, QueryParams};
pub use projection::{Projection, VERSION_FIELD};
pub use sort::{DEFAULT_SORT, Sort, SortDirection, SortKey};
