//! Tour endpoints: generic CRUD plus aggregations and geo queries.
//!
//! ```text
//! GET    /api/v1/tours
//! POST   /api/v1/tours                                            admin, lead-guide
//! GET    /api/v1/tours/top-5-cheap
//! GET    /api/v1/tours/tour-stats
//! GET    /api/v1/tours/monthly-plan/{year}                        admin, lead-guide, guide
//! GET    /api/v1/tours/tours-within/{distance}/center/{latlng}/unit/{unit}
//! GET    /api/v1/tours/distances/{latlng}/unit/{unit}
//! GET    /api/v1/tours/{id}
//! PATCH  /api/v1/tours/{id}                                       admin, lead-guide
//! DELETE /api/v1/tours/{id}                                       admin, lead-guide
//! ```

use actix_web::{HttpRequest, HttpResponse, Scope, get, web};
use api_query::Filter;
use serde_json::json;

use crate::domain::{
    DistanceUnit, Error, GeoPoint, ResourceService, Role, TourInsights, TourResource,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::CurrentUser;
use crate::inbound::http::body::JsonBody;
use crate::inbound::http::resources::{
    self, data_envelope, get_all, get_one, listing_response, query_params,
};
use crate::inbound::http::reviews;

type Tours = web::Data<ResourceService<TourResource>>;

const MANAGERS: [Role; 2] = [Role::Admin, Role::LeadGuide];
const PLANNERS: [Role; 3] = [Role::Admin, Role::LeadGuide, Role::Guide];

const CHEAP_LIMIT: &str = "5";
const CHEAP_SORT: &str = "-ratingsAverage,price";
const CHEAP_FIELDS: &str = "name,price,ratingsAverage,summary,difficulty";

/// `GET /tours/top-5-cheap`: the five best-rated tours, cheapest first on
/// ties.
#[get("/top-5-cheap")]
pub async fn top_five_cheap(tours: Tours, req: HttpRequest) -> ApiResult<HttpResponse> {
    let mut params = query_params(&req)?;
    params.set("limit", CHEAP_LIMIT);
    params.set("sort", CHEAP_SORT);
    params.set("fields", CHEAP_FIELDS);
    resources::list(&tours, Filter::all(), params).await
}

/// `GET /tours/tour-stats`.
#[get("/tour-stats")]
pub async fn tour_stats(insights: web::Data<TourInsights>) -> ApiResult<HttpResponse> {
    let stats = insights.stats().await?;
    Ok(HttpResponse::Ok().json(json!({"status": "success", "data": {"stats": stats}})))
}

/// `GET /tours/monthly-plan/{year}`.
#[get("/monthly-plan/{year}")]
pub async fn monthly_plan(
    user: CurrentUser,
    insights: web::Data<TourInsights>,
    year: web::Path<String>,
) -> ApiResult<HttpResponse> {
    user.require(&PLANNERS)?;
    let year = year.into_inner();
    let parsed: i32 = year
        .trim()
        .parse()
        .map_err(|_| Error::invalid_request(format!("Invalid year: {year}.")))?;
    let plan = insights.monthly_plan(parsed).await?;
    Ok(HttpResponse::Ok().json(json!({"status": "success", "data": {"plan": plan}})))
}

/// `GET /tours/tours-within/{distance}/center/{latlng}/unit/{unit}`.
#[get("/tours-within/{distance}/center/{latlng}/unit/{unit}")]
pub async fn tours_within(
    insights: web::Data<TourInsights>,
    path: web::Path<(String, String, String)>,
) -> ApiResult<HttpResponse> {
    let (distance, latlng, unit) = path.into_inner();
    let center: GeoPoint = latlng.parse()?;
    let distance: f64 = distance
        .trim()
        .parse()
        .map_err(|_| Error::invalid_request("Please provide a valid distance."))?;
    let tours = insights
        .within(distance, center, DistanceUnit::parse(&unit))
        .await?;
    Ok(listing_response(tours.len(), tours))
}

/// `GET /tours/distances/{latlng}/unit/{unit}`.
#[get("/distances/{latlng}/unit/{unit}")]
pub async fn distances(
    insights: web::Data<TourInsights>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (latlng, unit) = path.into_inner();
    let center: GeoPoint = latlng.parse()?;
    let distances = insights.distances(center, DistanceUnit::parse(&unit)).await?;
    Ok(HttpResponse::Ok().json(data_envelope(distances)))
}

/// `POST /tours`.
pub async fn create_tour(user: CurrentUser, tours: Tours, body: JsonBody) -> ApiResult<HttpResponse> {
    user.require(&MANAGERS)?;
    resources::create(&tours, body).await
}

/// `PATCH /tours/{id}`.
pub async fn update_tour(
    user: CurrentUser,
    tours: Tours,
    id: web::Path<String>,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    user.require(&MANAGERS)?;
    resources::update_one(tours, id, body).await
}

/// `DELETE /tours/{id}`.
pub async fn delete_tour(
    user: CurrentUser,
    tours: Tours,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    user.require(&MANAGERS)?;
    resources::delete_one(tours, id).await
}

/// The `/tours` scope, including nested review routes.
#[must_use]
pub fn scope() -> Scope {
    web::scope("/tours")
        .service(top_five_cheap)
        .service(tour_stats)
        .service(monthly_plan)
        .service(tours_within)
        .service(distances)
        .service(reviews::nested_resource())
        .service(
            web::resource("")
                .route(web::get().to(get_all::<TourResource>))
                .route(web::post().to(create_tour)),
        )
        .service(
            web::resource("/{id}")
                .route(web::get().to(get_one::<TourResource>))
                .route(web::patch().to(update_tour))
                .route(web::delete().to(delete_tour)),
        )
}
