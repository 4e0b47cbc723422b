//! End-to-end coverage of the tour endpoints through the full middleware stack.

mod support;

use actix_web::http::StatusCode;
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};
use support::{ADMIN_EMAIL, ADMIN_PASSWORD, Harness, get, login, post_json, tour_body};
use tour_booking::inbound::http::error::ErrorMode;

#[rstest]
#[case("The Hiker", StatusCode::BAD_REQUEST)]
#[case("The Hiker!", StatusCode::CREATED)]
#[actix_web::test]
async fn tour_names_need_ten_characters(#[case] name: &str, #[case] expected: StatusCode) {
    let harness = Harness::new(ErrorMode::Restricted).with_admin().await;
    let app = harness.service().await;
    let cookie = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = test::call_service(
        &app,
        post_json("/api/v1/tours", tour_body(name, 497), Some(&cookie)),
    )
    .await;
    assert_eq!(res.status(), expected);
    if expected == StatusCode::BAD_REQUEST {
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["status"], json!("fail"));
        assert_eq!(
            body["message"],
            json!("A tour name must have more or equal to 10 characters")
        );
    }
}

#[rstest]
#[actix_web::test]
async fn creating_tours_requires_a_manager() {
    let harness = Harness::new(ErrorMode::Restricted).with_admin().await;
    let app = harness.service().await;

    let anonymous = test::call_service(
        &app,
        post_json("/api/v1/tours", tour_body("The Forest Hiker", 397), None),
    )
    .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let signup = test::call_service(
        &app,
        post_json(
            "/api/v1/users/signup",
            json!({
                "name": "Laura Wilson",
                "email": "laura@example.com",
                "password": "pass1234",
                "passwordConfirm": "pass1234",
            }),
            None,
        ),
    )
    .await;
    let customer = support::session_cookie(&signup);
    let res = test::call_service(
        &app,
        post_json(
            "/api/v1/tours",
            tour_body("The Forest Hiker", 397),
            Some(&customer),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_web::test]
async fn listing_filters_sorts_and_paginates() {
    let harness = Harness::new(ErrorMode::Restricted).with_admin().await;
    let app = harness.service().await;
    let cookie = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    for (name, price) in [
        ("The Forest Hiker", 397),
        ("The Sea Explorer", 497),
        ("The Snow Adventurer", 997),
        ("The City Wanderer", 1197),
    ] {
        let res = test::call_service(
            &app,
            post_json("/api/v1/tours", tour_body(name, price), Some(&cookie)),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let cheap: Value = test::call_and_read_body_json(
        &app,
        get("/api/v1/tours?price[lt]=1000&sort=-price&fields=name,price", None),
    )
    .await;
    assert_eq!(cheap["results"], json!(3));
    let names: Vec<&str> = cheap["data"]["data"]
        .as_array()
        .expect("tour list")
        .iter()
        .filter_map(|tour| tour["name"].as_str())
        .collect();
    assert_eq!(
        names,
        ["The Snow Adventurer", "The Sea Explorer", "The Forest Hiker"]
    );
    assert!(cheap["data"]["data"][0].get("summary").is_none());

    let second: Value =
        test::call_and_read_body_json(&app, get("/api/v1/tours?page=2&limit=3&sort=price", None))
            .await;
    assert_eq!(second["results"], json!(1));
    assert_eq!(second["data"]["data"][0]["name"], json!("The City Wanderer"));

    let past_end = test::call_service(&app, get("/api/v1/tours?page=3&limit=3", None)).await;
    assert_eq!(past_end.status(), StatusCode::NOT_FOUND);

    let top: Value = test::call_and_read_body_json(&app, get("/api/v1/tours/top-5-cheap", None))
        .await;
    assert_eq!(top["results"], json!(4));
}

#[rstest]
#[actix_web::test]
async fn duplicate_names_conflict() {
    let harness = Harness::new(ErrorMode::Restricted).with_admin().await;
    let app = harness.service().await;
    let cookie = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let first = test::call_service(
        &app,
        post_json("/api/v1/tours", tour_body("The Forest Hiker", 397), Some(&cookie)),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let res = test::call_service(
        &app,
        post_json("/api/v1/tours", tour_body("The Forest Hiker", 497), Some(&cookie)),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body["message"],
        json!("Duplicate field value: \"The Forest Hiker\", Please use another value")
    );
}

#[rstest]
#[actix_web::test]
async fn updating_a_missing_tour_is_not_found() {
    let harness = Harness::new(ErrorMode::Restricted).with_admin().await;
    let app = harness.service().await;
    let cookie = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri("/api/v1/tours/5c88fa8c-f4af-4a39-9709-c2955c88fa8c")
            .cookie(cookie.clone())
            .set_json(json!({"price": 450}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], json!("No tour found with that ID"));

    let malformed = test::call_service(&app, get("/api/v1/tours/wwwwww", None)).await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(malformed).await;
    assert_eq!(body["message"], json!("Invalid _id: wwwwww."));
}

#[rstest]
#[actix_web::test]
async fn nested_reviews_update_tour_ratings() {
    let harness = Harness::new(ErrorMode::Restricted).with_admin().await;
    let app = harness.service().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let created: Value = test::call_and_read_body_json(
        &app,
        post_json("/api/v1/tours", tour_body("The Forest Hiker", 397), Some(&admin)),
    )
    .await;
    let tour_id = created["data"]["data"]["_id"]
        .as_str()
        .expect("tour id")
        .to_owned();

    let signup = test::call_service(
        &app,
        post_json(
            "/api/v1/users/signup",
            json!({
                "name": "Laura Wilson",
                "email": "laura@example.com",
                "password": "pass1234",
                "passwordConfirm": "pass1234",
            }),
            None,
        ),
    )
    .await;
    let customer = support::session_cookie(&signup);
    let review = test::call_service(
        &app,
        post_json(
            &format!("/api/v1/tours/{tour_id}/reviews"),
            json!({"review": "Loved every minute of it", "rating": 4}),
            Some(&customer),
        ),
    )
    .await;
    assert_eq!(review.status(), StatusCode::CREATED);

    let reviews: Value = test::call_and_read_body_json(
        &app,
        get(&format!("/api/v1/tours/{tour_id}/reviews"), Some(&customer)),
    )
    .await;
    assert_eq!(reviews["results"], json!(1));
    assert_eq!(
        reviews["data"]["data"][0]["user"]["name"],
        json!("Laura Wilson")
    );

    let tour: Value =
        test::call_and_read_body_json(&app, get(&format!("/api/v1/tours/{tour_id}"), None)).await;
    assert_eq!(tour["data"]["data"]["ratingsQuantity"], json!(1));
    assert_eq!(tour["data"]["data"]["ratingsAverage"], json!(4.0));
}
