//! Account and user-administration endpoints.
//!
//! ```text
//! POST   /api/v1/users/signup            {"name","email","password","passwordConfirm"}
//! POST   /api/v1/users/login             {"email","password"}
//! GET    /api/v1/users/logout
//! PATCH  /api/v1/users/updateMyPassword  {"passwordCurrent","password","passwordConfirm"}
//! GET    /api/v1/users/me
//! PATCH  /api/v1/users/updateMe          {"name","email"}
//! DELETE /api/v1/users/deleteMe
//! GET    /api/v1/users                   admin
//! GET    /api/v1/users/{id}              admin
//! PATCH  /api/v1/users/{id}              admin
//! DELETE /api/v1/users/{id}              admin
//! ```
//!
//! Users are created through `signup` only; there is no administrative
//! `POST /users`.

use actix_web::{HttpRequest, HttpResponse, Scope, delete, get, patch, post, web};
use api_query::Filter;
use serde_json::{Value, json};

use crate::domain::{
    AuthService, Authenticated, Document, LoginCredentials, NewPassword, ResourceService, Role,
    SignupRequest, UserResource,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::CurrentUser;
use crate::inbound::http::body::JsonBody;
use crate::inbound::http::resources::{self, data_envelope, query_params};
use crate::inbound::http::session::SessionContext;

type Users = web::Data<ResourceService<UserResource>>;

const ADMINS: [Role; 1] = [Role::Admin];

fn text<'a>(body: &'a Document, field: &str) -> Option<&'a str> {
    body.get(field).and_then(Value::as_str)
}

fn user_envelope(user: Document) -> Value {
    json!({"status": "success", "data": {"user": user}})
}

/// Store the grant and answer with the user.
fn signed_in(
    session: &SessionContext,
    outcome: Authenticated,
    response: &mut actix_web::HttpResponseBuilder,
) -> ApiResult<HttpResponse> {
    session.persist_grant(&outcome.grant)?;
    Ok(response.json(user_envelope(outcome.user)))
}

/// Register an account and log it in.
#[post("/signup")]
pub async fn signup(
    auth: web::Data<AuthService>,
    session: SessionContext,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let password = NewPassword::try_new(text(&body, "password"), text(&body, "passwordConfirm"))?;
    let request = SignupRequest {
        name: text(&body, "name").map(str::to_owned),
        email: text(&body, "email").map(str::to_owned),
        password,
    };
    let outcome = auth.signup(request).await?;
    signed_in(&session, outcome, &mut HttpResponse::Created())
}

/// Exchange credentials for a session.
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    session: SessionContext,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(text(&body, "email"), text(&body, "password"))?;
    let outcome = auth.login(&credentials).await?;
    signed_in(&session, outcome, &mut HttpResponse::Ok())
}

/// Forget the session.
#[get("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::Ok().json(json!({"status": "success"}))
}

/// Change the caller's password and issue a fresh session.
#[patch("/updateMyPassword")]
pub async fn update_my_password(
    user: CurrentUser,
    auth: web::Data<AuthService>,
    session: SessionContext,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let password = NewPassword::try_new(text(&body, "password"), text(&body, "passwordConfirm"))?;
    let outcome = auth
        .update_password(&user.0, text(&body, "passwordCurrent"), password)
        .await?;
    signed_in(&session, outcome, &mut HttpResponse::Ok())
}

/// The caller's own document.
#[get("/me")]
pub async fn me(user: CurrentUser, users: Users) -> ApiResult<HttpResponse> {
    let document = users.get(&user.0.id.to_string()).await?;
    Ok(HttpResponse::Ok().json(data_envelope(document)))
}

/// Update the caller's name or e-mail.
#[patch("/updateMe")]
pub async fn update_me(
    user: CurrentUser,
    auth: web::Data<AuthService>,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    let updated = auth.update_me(&user.0, &body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user_envelope(updated)))
}

/// Deactivate the caller's account and log out.
#[delete("/deleteMe")]
pub async fn delete_me(
    user: CurrentUser,
    auth: web::Data<AuthService>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    auth.deactivate(&user.0).await?;
    session.clear();
    Ok(HttpResponse::NoContent().finish())
}

/// `GET /users`.
pub async fn list_users(user: CurrentUser, users: Users, req: HttpRequest) -> ApiResult<HttpResponse> {
    user.require(&ADMINS)?;
    resources::list(&users, Filter::all(), query_params(&req)?).await
}

/// `GET /users/{id}`.
pub async fn get_user(
    user: CurrentUser,
    users: Users,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    user.require(&ADMINS)?;
    resources::get_one(users, id).await
}

/// `PATCH /users/{id}`.
pub async fn update_user(
    user: CurrentUser,
    users: Users,
    id: web::Path<String>,
    body: JsonBody,
) -> ApiResult<HttpResponse> {
    user.require(&ADMINS)?;
    resources::update_one(users, id, body).await
}

/// `DELETE /users/{id}`.
pub async fn delete_user(
    user: CurrentUser,
    users: Users,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    user.require(&ADMINS)?;
    resources::delete_one(users, id).await
}

/// The `/users` scope.
#[must_use]
pub fn scope() -> Scope {
    web::scope("/users")
        .service(signup)
        .service(login)
        .service(logout)
        .service(update_my_password)
        .service(me)
        .service(update_me)
        .service(delete_me)
        .service(web::resource("").route(web::get().to(list_users)))
        .service(
            web::resource("/{id}")
                .route(web::get().to(get_user))
                .route(web::patch().to(update_user))
                .route(web::delete().to(delete_user)),
        )
}

#[cfg(test)]
mod tests;
