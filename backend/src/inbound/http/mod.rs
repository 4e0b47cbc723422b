//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod body;
pub mod bookings;
pub mod error;
pub mod health;
pub mod resources;
pub mod reviews;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod tours;
pub mod users;

use actix_web::{HttpRequest, HttpResponse, web};

pub use error::ApiResult;

use crate::domain::Error;

/// Register the versioned API routes on `cfg`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(health::status)
        .service(tours::scope())
        .service(users::scope())
        .service(reviews::scope())
        .service(bookings::scope());
}

/// Fallback for requests no route matched.
pub async fn route_not_found(req: HttpRequest) -> ApiResult<HttpResponse> {
    Err(Error::not_found(format!(
        "Can't find {} on this server!",
        req.path()
    )))
}
