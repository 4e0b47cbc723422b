//! Domain primitives, collection schemas and services.
//!
//! Purpose: define the documents, schemas and use-cases of the tour booking
//! service independently of HTTP and storage. Inbound adapters call the
//! services; outbound adapters satisfy the ports in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: tagged, transport-agnostic failures.
//! - Document / DocumentId / Collection: schemaless storage primitives.
//! - ResourceService: generic list/get/create/update/delete per resource.
//! - AuthService: sign-up, login, session authorisation and self-service.
//! - TourInsights / RatingsAggregator: aggregations over tours and reviews.

pub mod auth;
pub mod booking;
pub mod document;
pub mod error;
pub mod ports;
pub mod resource;
pub mod review;
pub mod review_ratings;
pub(crate) mod schema_rules;
pub mod tour;
pub mod tour_insights;
pub mod trace_id;
pub mod user;
pub mod validation;

pub use self::auth::{
    AuthService, Authenticated, AuthenticatedUser, LoginCredentials, NewPassword, SessionGrant,
    SignupRequest,
};
pub use self::booking::BookingSchema;
pub use self::document::{
    Collection, Document, DocumentId, ID_FIELD, VERSION_FIELD, format_timestamp, parse_timestamp,
};
pub use self::error::{Error, ErrorCode};
pub use self::resource::{
    BookingResource, Listing, Resource, ResourceService, ReviewResource, TourResource,
    UserResource, WriteHook,
};
pub use self::review::ReviewSchema;
pub use self::review_ratings::{RatingSummary, RatingsAggregator};
pub use self::tour::TourSchema;
pub use self::tour_insights::{DistanceUnit, GeoPoint, TourInsights};
pub use self::trace_id::TraceId;
pub use self::user::{Role, UserSchema};
pub use self::validation::{FieldViolation, ValidationErrors};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use tour_booking::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
