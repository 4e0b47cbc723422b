//! Tests for account and user-administration handlers.

use super::{Value, json, scope};
use crate::domain::Collection;
use crate::domain::ports::DocumentStore;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::test_utils::{session_cookie, state_over, test_session_middleware};
use crate::outbound::persistence::InMemoryDocumentStore;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;

const ADMIN_EMAIL: &str = "admin@natours.io";
const ADMIN_PASSWORD: &str = "test1234";

async fn seeded_state() -> HttpState {
    let clock = Arc::new(DefaultClock);
    let store = Arc::new(InMemoryDocumentStore::with_default_schemas(clock.clone()));
    let admin = json!({
        "name": "Jonas Schmedtmann",
        "email": ADMIN_EMAIL,
        "role": "admin",
        "password": format!("plain${ADMIN_PASSWORD}"),
    })
    .as_object()
    .cloned()
    .expect("object fixture");
    store
        .insert(Collection::Users, admin)
        .await
        .expect("admin inserted");
    state_over(store, clock)
}

async fn app(
    state: &HttpState,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .wrap(test_session_middleware())
            .configure(|cfg| state.configure(cfg))
            .service(scope()),
    )
    .await
}

fn signup_body(email: &str) -> Value {
    json!({
        "name": "Laura Wilson",
        "email": email,
        "password": "pass1234",
        "passwordConfirm": "pass1234",
    })
}

fn login_request(email: &str, password: &str) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/users/login")
        .set_json(json!({"email": email, "password": password}))
        .to_request()
}

fn get_with(uri: &str, cookie: Option<Cookie<'static>>) -> actix_http::Request {
    let mut req = test::TestRequest::get().uri(uri);
    if let Some(cookie) = cookie {
        req = req.cookie(cookie);
    }
    req.to_request()
}

#[rstest]
#[actix_web::test]
async fn signup_logs_the_new_user_in() {
    let state = seeded_state().await;
    let app = app(&state).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/users/signup")
            .set_json(signup_body("laura@example.com"))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let cookie = session_cookie(&res);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["data"]["user"]["email"], json!("laura@example.com"));
    assert_eq!(body["data"]["user"]["role"], json!("user"));
    assert!(body["data"]["user"].get("password").is_none());

    let me: Value =
        test::call_and_read_body_json(&app, get_with("/users/me", Some(cookie))).await;
    assert_eq!(me["data"]["data"]["name"], json!("Laura Wilson"));
}

#[rstest]
#[actix_web::test]
async fn signup_checks_the_confirmation() {
    let state = seeded_state().await;
    let app = app(&state).await;
    let mut body = signup_body("laura@example.com");
    body["passwordConfirm"] = json!("pass12345");

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/users/signup")
            .set_json(body)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], json!("Passwords are not the same!"));
}

#[rstest]
#[actix_web::test]
async fn duplicate_emails_conflict() {
    let state = seeded_state().await;
    let app = app(&state).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/users/signup")
            .set_json(signup_body(ADMIN_EMAIL))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[rstest]
#[case(ADMIN_EMAIL, "wrong-password")]
#[case("nobody@example.com", ADMIN_PASSWORD)]
#[actix_web::test]
async fn login_rejects_bad_credentials(#[case] email: &str, #[case] password: &str) {
    let state = seeded_state().await;
    let app = app(&state).await;

    let res = test::call_service(&app, login_request(email, password)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], json!("Incorrect email or password"));
}

#[rstest]
#[actix_web::test]
async fn anonymous_requests_are_unauthorised() {
    let state = seeded_state().await;
    let app = app(&state).await;

    let res = test::call_service(&app, get_with("/users/me", None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body["message"],
        json!("You are not logged in! Please log in to get access.")
    );
}

#[rstest]
#[actix_web::test]
async fn logout_drops_the_grant() {
    let state = seeded_state().await;
    let app = app(&state).await;
    let login = test::call_service(&app, login_request(ADMIN_EMAIL, ADMIN_PASSWORD)).await;
    assert_eq!(login.status(), StatusCode::OK);

    let logout = test::call_service(
        &app,
        get_with("/users/logout", Some(session_cookie(&login))),
    )
    .await;
    assert_eq!(logout.status(), StatusCode::OK);
    let cleared = session_cookie(&logout);

    let res = test::call_service(&app, get_with("/users/me", Some(cleared))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn administration_requires_the_admin_role() {
    let state = seeded_state().await;
    let app = app(&state).await;

    let signup = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/users/signup")
            .set_json(signup_body("laura@example.com"))
            .to_request(),
    )
    .await;
    let res = test::call_service(&app, get_with("/users", Some(session_cookie(&signup)))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let login = test::call_service(&app, login_request(ADMIN_EMAIL, ADMIN_PASSWORD)).await;
    let body: Value = test::call_and_read_body_json(
        &app,
        get_with("/users", Some(session_cookie(&login))),
    )
    .await;
    assert_eq!(body["results"], json!(2));
}

#[rstest]
#[actix_web::test]
async fn update_me_refuses_password_changes() {
    let state = seeded_state().await;
    let app = app(&state).await;
    let login = test::call_service(&app, login_request(ADMIN_EMAIL, ADMIN_PASSWORD)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri("/users/updateMe")
            .cookie(session_cookie(&login))
            .set_json(json!({"password": "newpass123"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn password_change_issues_a_working_session() {
    let state = seeded_state().await;
    let app = app(&state).await;
    let login = test::call_service(&app, login_request(ADMIN_EMAIL, ADMIN_PASSWORD)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri("/users/updateMyPassword")
            .cookie(session_cookie(&login))
            .set_json(json!({
                "passwordCurrent": ADMIN_PASSWORD,
                "password": "newpass123",
                "passwordConfirm": "newpass123",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let fresh = session_cookie(&res);

    let me = test::call_service(&app, get_with("/users/me", Some(fresh))).await;
    assert_eq!(me.status(), StatusCode::OK);
    let relogin = test::call_service(&app, login_request(ADMIN_EMAIL, "newpass123")).await;
    assert_eq!(relogin.status(), StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn delete_me_deactivates_the_account() {
    let state = seeded_state().await;
    let app = app(&state).await;
    let signup = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/users/signup")
            .set_json(signup_body("laura@example.com"))
            .to_request(),
    )
    .await;

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/users/deleteMe")
            .cookie(session_cookie(&signup))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let relogin = test::call_service(&app, login_request("laura@example.com", "pass1234")).await;
    assert_eq!(relogin.status(), StatusCode::UNAUTHORIZED);
}
