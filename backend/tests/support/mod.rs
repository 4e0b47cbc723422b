//! Shared harness for end-to-end tests over the assembled application.
//!
//! Integration tests compile as separate crates, so each one pulls this module
//! in with `mod support;` and uses the subset of helpers it needs.
#![allow(dead_code, reason = "each test crate uses a subset of the helpers")]

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web};
use chrono::{TimeDelta, TimeZone, Utc};
use serde_json::{Value, json};
use tour_booking::domain::Collection;
use tour_booking::domain::ports::DocumentStore;
use tour_booking::inbound::http::error::ErrorMode;
use tour_booking::inbound::http::health::HealthState;
use tour_booking::inbound::http::state::{HttpState, HttpStatePorts};
use tour_booking::middleware::RateLimiter;
use tour_booking::outbound::persistence::InMemoryDocumentStore;
use tour_booking::server::{AppDependencies, build_app};
use tour_booking::test_support::{MutableClock, PlainTextHasher};

pub const ADMIN_EMAIL: &str = "admin@natours.io";
pub const ADMIN_PASSWORD: &str = "test1234";
pub const SESSION_TTL_DAYS: i64 = 90;
const DEFAULT_BUDGET: u32 = 1_000;

/// Application wiring over an in-memory store and a clock the test controls.
pub struct Harness {
    pub clock: Arc<MutableClock>,
    pub store: Arc<InMemoryDocumentStore>,
    error_mode: ErrorMode,
    budget: u32,
    key: Key,
}

impl Harness {
    pub fn new(error_mode: ErrorMode) -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid start instant");
        let clock = Arc::new(MutableClock::new(start));
        let store = Arc::new(InMemoryDocumentStore::with_default_schemas(clock.clone()));
        Self {
            clock,
            store,
            error_mode,
            budget: DEFAULT_BUDGET,
            key: Key::generate(),
        }
    }

    pub fn with_rate_limit(mut self, budget: u32) -> Self {
        self.budget = budget;
        self
    }

    /// Insert an administrator whose password is [`ADMIN_PASSWORD`].
    pub async fn with_admin(self) -> Self {
        let admin = json!({
            "name": "Jonas Schmedtmann",
            "email": ADMIN_EMAIL,
            "role": "admin",
            "password": format!("plain${ADMIN_PASSWORD}"),
        })
        .as_object()
        .cloned()
        .expect("object fixture");
        self.store
            .insert(Collection::Users, admin)
            .await
            .expect("admin inserted");
        self
    }

    pub fn dependencies(&self) -> AppDependencies {
        self.dependencies_over(self.store.clone())
    }

    /// Wire the application over `store` instead of the harness store.
    pub fn dependencies_over(&self, store: Arc<dyn DocumentStore>) -> AppDependencies {
        let session_ttl = TimeDelta::days(SESSION_TTL_DAYS);
        let ports = HttpStatePorts {
            store,
            hasher: Arc::new(PlainTextHasher),
            clock: self.clock.clone(),
        };
        AppDependencies {
            health_state: web::Data::new(HealthState::with_clock("test", self.clock.clone())),
            http_state: HttpState::new(ports, session_ttl),
            rate_limiter: Arc::new(RateLimiter::new(
                self.budget,
                TimeDelta::hours(1),
                self.clock.clone(),
            )),
            key: self.key.clone(),
            cookie_secure: false,
            session_ttl,
            error_mode: self.error_mode,
            body_limit: 10 * 1024,
        }
    }

    pub async fn service(
        &self,
    ) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
    {
        test::init_service(build_app(self.dependencies())).await
    }
}

/// Extract the session cookie set by `res`.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Log in and return the session cookie.
pub async fn login<S, B>(app: &S, email: &str, password: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/users/login")
            .set_json(json!({"email": email, "password": password}))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "login failed: {}", res.status());
    session_cookie(&res)
}

/// A tour body that passes validation.
pub fn tour_body(name: &str, price: u32) -> Value {
    json!({
        "name": name,
        "duration": 5,
        "maxGroupSize": 12,
        "difficulty": "medium",
        "price": price,
        "summary": "A walk through pine forests and alpine meadows",
        "imageCover": "tour-cover.jpg",
        "startLocation": {
            "type": "Point",
            "coordinates": [-115.570154, 51.178456],
            "description": "Banff, CAN"
        },
        "startDates": ["2026-07-20T09:00:00.000Z"]
    })
}

/// POST `body` to `uri` with an optional session cookie.
pub fn post_json(uri: &str, body: Value, cookie: Option<&Cookie<'static>>) -> Request {
    let mut req = test::TestRequest::post().uri(uri).set_json(body);
    if let Some(cookie) = cookie {
        req = req.cookie(cookie.clone());
    }
    req.to_request()
}

/// GET `uri` with an optional session cookie.
pub fn get(uri: &str, cookie: Option<&Cookie<'static>>) -> Request {
    let mut req = test::TestRequest::get().uri(uri);
    if let Some(cookie) = cookie {
        req = req.cookie(cookie.clone());
    }
    req.to_request()
}
