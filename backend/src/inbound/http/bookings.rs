//! Booking endpoints, restricted to administrators and lead guides.
//!
//! ```text
//! GET    /api/v1/bookings
//! POST   /api/v1/bookings
//! GET    /api/v1/bookings/{id}
//! PATCH  /api/v1/bookings/{id}
//! DELETE /api/v1/bookings/{id}
//! ```

use actix_web::{HttpRequest, HttpResponse, Scope, web};

use crate::domain::{BookingResource, ResourceService, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::CurrentUser;
use crate::inbound::http::body::JsonBody;
use crate::inbound::http::resources;

type Bookings = web::Data<ResourceService<BookingResource>>;

const STAFF: [Role; 2] = [Role::Admin, Role::LeadGuide];

/// `GET /bookings`.
pub async fn list_bookings(
    user: CurrentUser,
    bookings: Bookings,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    user.require(&STAFF)?;
    resources::get_all(bookings, req).await
}

/// `POST /bookings`.
pub async fn create_booking(
    user: CurrentUser,
    bookings: Bookings,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    user.require(&STAFF)?;
    resources::create_one(bookings, body).await
}

/// `GET /bookings/{id}`.
pub async fn get_booking(
    user: CurrentUser,
    bookings: Bookings,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    user.require(&STAFF)?;
    resources::get_one(bookings, id).await
}

/// `PATCH /bookings/{id}`.
pub async fn update_booking(
    user: CurrentUser,
    bookings: Bookings,
    id: web::Path<String>,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    user.require(&STAFF)?;
    resources::update_one(bookings, id, body).await
}

/// `DELETE /bookings/{id}`.
pub async fn delete_booking(
    user: CurrentUser,
    bookings: Bookings,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    user.require(&STAFF)?;
    resources::delete_one(bookings, id).await
}

/// The `/bookings` scope.
#[must_use]
pub fn scope() -> Scope {
    web::scope("/bookings")
        .service(
            web::resource("")
                .route(web::get().to(list_bookings))
                .route(web::post().to(create_booking)),
        )
        .service(
            web::resource("/{id}")
                .route(web::get().to(get_booking))
                .route(web::patch().to(update_booking))
                .route(web::delete().to(delete_booking)),
        )
}
