//! Security response headers applied to every response.

use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;

const HSTS: &str = "max-age=31536000; includeSubDomains";
const CSP: &str = "default-src 'self'";

/// Default headers hardening browser handling of every response.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use tour_booking::middleware::security_headers;
///
/// let app = App::new().wrap(security_headers());
/// ```
#[must_use]
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::STRICT_TRANSPORT_SECURITY, HSTS))
        .add((header::CONTENT_SECURITY_POLICY, CSP))
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::X_FRAME_OPTIONS, "SAMEORIGIN"))
        .add((header::REFERRER_POLICY, "no-referrer"))
        .add((header::X_DNS_PREFETCH_CONTROL, "off"))
}
