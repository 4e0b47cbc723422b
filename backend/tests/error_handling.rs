//! End-to-end coverage of error rendering in both modes and of session expiry.

mod support;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{http::header, test};
use api_query::{Filter, ListQuery};
use async_trait::async_trait;
use rstest::rstest;
use serde_json::{Value, json};
use support::{ADMIN_EMAIL, ADMIN_PASSWORD, Harness, SESSION_TTL_DAYS, get, login};
use tour_booking::domain::ports::{DocumentStore, Populate, StoreError};
use tour_booking::domain::{Collection, Document, DocumentId};
use tour_booking::inbound::http::error::ErrorMode;
use tour_booking::server::build_app;

/// A store whose backend fails every query.
struct BrokenStore;

fn broken() -> StoreError {
    StoreError::query("index corrupted")
}

#[async_trait]
impl DocumentStore for BrokenStore {
    async fn insert(&self, _: Collection, _: Document) -> Result<Document, StoreError> {
        Err(broken())
    }

    async fn find(
        &self,
        _: Collection,
        _: &ListQuery,
        _: &[Populate],
    ) -> Result<Vec<Document>, StoreError> {
        Err(broken())
    }

    async fn count(&self, _: Collection, _: &Filter) -> Result<u64, StoreError> {
        Err(broken())
    }

    async fn find_by_id(
        &self,
        _: Collection,
        _: DocumentId,
        _: &[Populate],
    ) -> Result<Option<Document>, StoreError> {
        Err(broken())
    }

    async fn find_one(
        &self,
        _: Collection,
        _: &Filter,
        _: &[&'static str],
    ) -> Result<Option<Document>, StoreError> {
        Err(broken())
    }

    async fn update_by_id(
        &self,
        _: Collection,
        _: DocumentId,
        _: Document,
    ) -> Result<Option<Document>, StoreError> {
        Err(broken())
    }

    async fn delete_by_id(
        &self,
        _: Collection,
        _: DocumentId,
    ) -> Result<Option<Document>, StoreError> {
        Err(broken())
    }
}

#[rstest]
#[actix_web::test]
async fn restricted_mode_hides_internal_failures() {
    let harness = Harness::new(ErrorMode::Restricted);
    let app = test::init_service(build_app(
        harness.dependencies_over(Arc::new(BrokenStore)),
    ))
    .await;

    let res = test::call_service(&app, get("/api/v1/tours", None)).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body,
        json!({"status": "error", "message": "Something went very wrong!"})
    );
}

#[rstest]
#[actix_web::test]
async fn verbose_mode_reports_the_failure_in_full() {
    let harness = Harness::new(ErrorMode::Verbose);
    let app = test::init_service(build_app(
        harness.dependencies_over(Arc::new(BrokenStore)),
    ))
    .await;

    let res = test::call_service(&app, get("/api/v1/tours", None)).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], json!("error"));
    assert_eq!(body["error"]["code"], json!("internal_error"));
    assert_eq!(body["error"]["isOperational"], json!(false));
    assert!(body["error"]["traceId"].is_string());
    let stack = body["stack"].as_str().expect("stack present");
    assert!(stack.contains("index corrupted"), "stack was {stack}");
}

#[rstest]
#[case(ErrorMode::Restricted)]
#[case(ErrorMode::Verbose)]
#[actix_web::test]
async fn operational_errors_keep_their_message(#[case] mode: ErrorMode) {
    let harness = Harness::new(mode);
    let app = harness.service().await;

    let res = test::call_service(&app, get("/api/v1/bookings", None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], json!("fail"));
    assert_eq!(
        body["message"],
        json!("You are not logged in! Please log in to get access.")
    );
}

#[rstest]
#[case("/api/v1/nowhere")]
#[case("/api/v2/tours")]
#[actix_web::test]
async fn unknown_api_routes_are_not_found(#[case] path: &str) {
    let harness = Harness::new(ErrorMode::Restricted);
    let app = harness.service().await;

    let res = test::call_service(&app, get(path, None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body["message"],
        json!(format!("Can't find {path} on this server!"))
    );
}

#[rstest]
#[actix_web::test]
async fn unknown_pages_render_html() {
    let harness = Harness::new(ErrorMode::Restricted);
    let app = harness.service().await;

    let res = test::call_service(&app, get("/tour/the-lost-valley", None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(content_type.starts_with("text/html"), "got {content_type}");
    let body = test::read_body(res).await;
    let page = std::str::from_utf8(&body).expect("utf-8 page");
    assert!(page.contains("Can&#39;t find /tour/the-lost-valley on this server!"));
}

#[rstest]
#[actix_web::test]
async fn sessions_expire_after_their_lifetime() {
    let harness = Harness::new(ErrorMode::Restricted).with_admin().await;
    let app = harness.service().await;
    let cookie = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let fresh = test::call_service(&app, get("/api/v1/users/me", Some(&cookie))).await;
    assert_eq!(fresh.status(), StatusCode::OK);

    harness
        .clock
        .advance_seconds((SESSION_TTL_DAYS + 1) * 24 * 60 * 60);
    let res = test::call_service(&app, get("/api/v1/users/me", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body["message"],
        json!("Your token has been expired! Please log in again")
    );
}
