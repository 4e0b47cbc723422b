//! End-to-end coverage of the cross-cutting middleware and health probes.

mod support;

use actix_web::http::StatusCode;
use actix_web::http::header::{self, HeaderName};
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};
use support::{Harness, get};
use tour_booking::inbound::http::error::ErrorMode;
use tour_booking::middleware::{RATE_LIMIT_MESSAGE, TRACE_ID_HEADER};
use uuid::Uuid;

#[rstest]
#[case(header::STRICT_TRANSPORT_SECURITY)]
#[case(header::CONTENT_SECURITY_POLICY)]
#[case(header::X_CONTENT_TYPE_OPTIONS)]
#[case(header::X_FRAME_OPTIONS)]
#[case(header::REFERRER_POLICY)]
#[actix_web::test]
async fn every_response_carries_security_headers(#[case] name: HeaderName) {
    let harness = Harness::new(ErrorMode::Restricted);
    let app = harness.service().await;

    for path in ["/api/v1/tours", "/api/v1/missing", "/health/live"] {
        let res = test::call_service(&app, get(path, None)).await;
        assert!(
            res.headers().contains_key(&name),
            "{path} lacks {name}"
        );
    }
}

#[rstest]
#[actix_web::test]
async fn responses_echo_a_trace_id() {
    let harness = Harness::new(ErrorMode::Restricted);
    let app = harness.service().await;

    let res = test::call_service(&app, get("/api/v1/tours", None)).await;
    let trace_id = res
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .expect("trace id header");
    assert!(Uuid::parse_str(trace_id).is_ok(), "{trace_id} is not a UUID");

    let upstream = "6f1c2f4e-8a7b-4d1c-9e3f-2a5b7c9d1e0f";
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/tours")
            .insert_header((TRACE_ID_HEADER, upstream))
            .to_request(),
    )
    .await;
    assert_eq!(
        res.headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok()),
        Some(upstream)
    );
}

#[rstest]
#[actix_web::test]
async fn api_requests_beyond_the_budget_are_refused() {
    let harness = Harness::new(ErrorMode::Restricted).with_rate_limit(2);
    let app = harness.service().await;

    for remaining in ["1", "0"] {
        let res = test::call_service(&app, get("/api/v1/tours", None)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()
                .get("x-ratelimit-remaining")
                .and_then(|value| value.to_str().ok()),
            Some(remaining)
        );
    }

    let res = test::call_service(&app, get("/api/v1/tours", None)).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], json!(RATE_LIMIT_MESSAGE));

    let probe = test::call_service(&app, get("/health/live", None)).await;
    assert_eq!(probe.status(), StatusCode::OK);

    harness.clock.advance_seconds(60 * 60 + 1);
    let res = test::call_service(&app, get("/api/v1/tours", None)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn health_reports_uptime_and_environment() {
    let harness = Harness::new(ErrorMode::Restricted);
    let app = harness.service().await;
    harness.clock.advance_seconds(42);

    let res = test::call_service(&app, get("/api/v1/health", None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], json!("success"));
    assert_eq!(body["message"], json!("Server is running"));
    assert_eq!(body["environment"], json!("test"));
    assert_eq!(body["uptime"], json!(42.0));
}

#[rstest]
#[actix_web::test]
async fn readiness_follows_the_health_state() {
    let harness = Harness::new(ErrorMode::Restricted);
    let deps = harness.dependencies();
    let health = deps.health_state.clone();
    let app = test::init_service(tour_booking::server::build_app(deps)).await;

    let res = test::call_service(&app, get("/health/ready", None)).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    health.mark_ready();
    let res = test::call_service(&app, get("/health/ready", None)).await;
    assert_eq!(res.status(), StatusCode::OK);

    health.mark_unhealthy();
    let res = test::call_service(&app, get("/health/live", None)).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}
