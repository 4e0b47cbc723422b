//! Review endpoints. Every route requires a logged-in user.
//!
//! ```text
//! GET    /api/v1/reviews
//! POST   /api/v1/reviews              role user
//! GET    /api/v1/reviews/{id}
//! PATCH  /api/v1/reviews/{id}         roles user, admin
//! DELETE /api/v1/reviews/{id}         roles user, admin
//! GET    /api/v1/tours/{tourId}/reviews
//! POST   /api/v1/tours/{tourId}/reviews
//! ```

use actix_web::{HttpRequest, HttpResponse, Scope, web};
use api_query::Filter;
use serde_json::json;

use crate::domain::{ResourceService, ReviewResource, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::CurrentUser;
use crate::inbound::http::body::JsonBody;
use crate::inbound::http::resources::{self, query_params};

type Reviews = web::Data<ResourceService<ReviewResource>>;

const AUTHORS: [Role; 1] = [Role::User];
const MODERATORS: [Role; 2] = [Role::User, Role::Admin];

/// Fill in the reviewed tour and the author when the body omits them.
fn with_references(body: JsonBody, tour: Option<&str>, user: &CurrentUser) -> JsonBody {
    let mut document = body.into_inner();
    if let Some(tour) = tour {
        document
            .entry("tour")
            .or_insert_with(|| json!(tour));
    }
    document
        .entry("user")
        .or_insert_with(|| json!(user.0.id.to_string()));
    JsonBody(document)
}

/// `GET /reviews`.
pub async fn list_reviews(
    _user: CurrentUser,
    reviews: Reviews,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    resources::list(&reviews, Filter::all(), query_params(&req)?).await
}

/// `POST /reviews`.
pub async fn create_review(
    user: CurrentUser,
    reviews: Reviews,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    user.require(&AUTHORS)?;
    resources::create(&reviews, with_references(body, None, &user)).await
}

/// `GET /tours/{tourId}/reviews`.
pub async fn list_tour_reviews(
    _user: CurrentUser,
    reviews: Reviews,
    tour_id: web::Path<String>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let base = Filter::by("tour", tour_id.into_inner());
    resources::list(&reviews, base, query_params(&req)?).await
}

/// `POST /tours/{tourId}/reviews`.
pub async fn create_tour_review(
    user: CurrentUser,
    reviews: Reviews,
    tour_id: web::Path<String>,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    user.require(&AUTHORS)?;
    let body = with_references(body, Some(tour_id.as_str()), &user);
    resources::create(&reviews, body).await
}

/// `GET /reviews/{id}`.
pub async fn get_review(
    _user: CurrentUser,
    reviews: Reviews,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    resources::get_one(reviews, id).await
}

/// `PATCH /reviews/{id}`.
pub async fn update_review(
    user: CurrentUser,
    reviews: Reviews,
    id: web::Path<String>,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    user.require(&MODERATORS)?;
    resources::update_one(reviews, id, body).await
}

/// `DELETE /reviews/{id}`.
pub async fn delete_review(
    user: CurrentUser,
    reviews: Reviews,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    user.require(&MODERATORS)?;
    resources::delete_one(reviews, id).await
}

/// Routes mounted under `/tours/{tourId}/reviews`.
pub(crate) fn nested_resource() -> actix_web::Resource {
    web::resource("/{tourId}/reviews")
        .route(web::get().to(list_tour_reviews))
        .route(web::post().to(create_tour_review))
}

/// The `/reviews` scope.
#[must_use]
pub fn scope() -> Scope {
    web::scope("/reviews")
        .service(
            web::resource("")
                .route(web::get().to(list_reviews))
                .route(web::post().to(create_review)),
        )
        .service(
            web::resource("/{id}")
                .route(web::get().to(get_review))
                .route(web::patch().to(update_review))
                .route(web::delete().to(delete_review)),
        )
}
