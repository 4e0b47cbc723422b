//! Generic HTTP handlers instantiated once per resource.
//!
//! ```text
//! GET    /api/v1/{resource}        get_all
//! POST   /api/v1/{resource}        create_one
//! GET    /api/v1/{resource}/{id}   get_one
//! PATCH  /api/v1/{resource}/{id}   update_one
//! DELETE /api/v1/{resource}/{id}   delete_one
//! ```

use actix_web::{HttpRequest, HttpResponse, web};
use api_query::{Filter, QueryParams};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::{Error, Listing, Resource, ResourceService};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::JsonBody;

/// Query keys that may repeat; every other key keeps its last value.
pub const REPEATABLE_KEYS: [&str; 6] = [
    "duration",
    "ratingsQuantity",
    "ratingsAverage",
    "maxGroupSize",
    "difficulty",
    "price",
];

/// Parse the request's query string into sanitised parameters.
///
/// # Errors
/// Returns `400` when the query string is not valid URL encoding.
pub fn query_params(req: &HttpRequest) -> Result<QueryParams, Error> {
    let web::Query(pairs) = web::Query::<Vec<(String, String)>>::from_query(req.query_string())
        .map_err(|err| Error::invalid_request(format!("Invalid query string: {err}")))?;
    Ok(QueryParams::from_pairs(pairs, &REPEATABLE_KEYS))
}

/// `{status:"success", data:{data:...}}`.
pub(crate) fn data_envelope(data: impl Serialize) -> Value {
    json!({"status": "success", "data": {"data": data}})
}

pub(crate) fn listing_response(results: usize, data: impl Serialize) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "success",
        "results": results,
        "data": {"data": data},
    }))
}

/// List documents of `R` matching `base` and the request's query.
pub(crate) async fn list<R: Resource>(
    service: &ResourceService<R>,
    base: Filter,
    params: QueryParams,
) -> ApiResult<HttpResponse> {
    let Listing { results, documents } = service.list(base, params).await?;
    Ok(listing_response(results, documents))
}

/// Insert a document of `R` and answer `201`.
pub(crate) async fn create<R: Resource>(
    service: &ResourceService<R>,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    let created = service.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(data_envelope(created)))
}

/// `GET /` for any resource.
pub async fn get_all<R: Resource>(
    service: web::Data<ResourceService<R>>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    list(&service, Filter::all(), query_params(&req)?).await
}

/// `GET /{id}` for any resource.
pub async fn get_one<R: Resource>(
    service: web::Data<ResourceService<R>>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let document = service.get(&id).await?;
    Ok(HttpResponse::Ok().json(data_envelope(document)))
}

/// `POST /` for any resource.
pub async fn create_one<R: Resource>(
    service: web::Data<ResourceService<R>>,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    create(&service, body).await
}

/// `PATCH /{id}` for any resource.
pub async fn update_one<R: Resource>(
    service: web::Data<ResourceService<R>>,
    id: web::Path<String>,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    let updated = service.update(&id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(data_envelope(updated)))
}

/// `DELETE /{id}` for any resource.
pub async fn delete_one<R: Resource>(
    service: web::Data<ResourceService<R>>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    service.delete(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}
