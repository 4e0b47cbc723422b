//! Fixed-window request budget per client address.
//!
//! Every client gets `budget` requests per window. The window starts with the
//! client's first request and resets once it has fully elapsed. Over-budget
//! requests fail with `429` before reaching a handler.
//!
//! Clients are keyed by the IP of the connected peer. Forwarding headers are
//! client-controlled and never consulted.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::task::{Context, Poll};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use mockable::Clock;
use tracing::warn;

use crate::domain::Error;

/// Message returned once a client exhausts its budget.
pub const RATE_LIMIT_MESSAGE: &str =
    "Too many requests from this IP, please try again in an hour";

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: DateTime<Utc>,
    hits: u32,
}

/// Per-client counters shared by every worker.
pub struct RateLimiter {
    budget: u32,
    window: TimeDelta,
    clock: Arc<dyn Clock>,
    windows: DashMap<String, Window>,
    last_sweep_ms: AtomicI64,
}

impl RateLimiter {
    /// Allow `budget` requests per `window` for each client.
    pub fn new(budget: u32, window: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        let last_sweep_ms = AtomicI64::new(clock.utc().timestamp_millis());
        Self {
            budget,
            window,
            clock,
            windows: DashMap::new(),
            last_sweep_ms,
        }
    }

    /// Requests allowed per window.
    #[must_use]
    pub fn budget(&self) -> u32 {
        self.budget
    }

    /// Record a request from `client`, returning how many remain in the
    /// window, or `None` once the budget is spent.
    pub fn allow(&self, client: &str) -> Option<u32> {
        let now = self.clock.utc();
        self.sweep(now);
        let mut entry = self.windows.entry(client.to_owned()).or_insert(Window {
            started: now,
            hits: 0,
        });
        if now - entry.started >= self.window {
            *entry = Window {
                started: now,
                hits: 0,
            };
        }
        if entry.hits >= self.budget {
            return None;
        }
        entry.hits += 1;
        Some(self.budget - entry.hits)
    }

    /// Clients currently holding a window.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Drop elapsed windows, at most once per window length.
    fn sweep(&self, now: DateTime<Utc>) {
        let now_ms = now.timestamp_millis();
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        if now_ms - last < self.window.num_milliseconds() {
            return;
        }
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            self.windows.retain(|_, window| now - window.started < self.window);
        }
    }
}

fn client_key(req: &ServiceRequest) -> String {
    req.peer_addr()
        .map_or_else(|| "unknown".to_owned(), |addr| addr.ip().to_string())
}

/// Middleware applying a shared [`RateLimiter`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use actix_web::{App, web};
/// use chrono::TimeDelta;
/// use mockable::DefaultClock;
/// use tour_booking::middleware::{RateLimit, RateLimiter};
///
/// let limiter = Arc::new(RateLimiter::new(100, TimeDelta::hours(1), Arc::new(DefaultClock)));
/// let app = App::new().service(web::scope("/api").wrap(RateLimit::new(limiter)));
/// ```
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<RateLimiter>,
}

impl RateLimit {
    /// Wrap a limiter shared across workers.
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service,
            limiter: Arc::clone(&self.limiter),
        }))
    }
}

/// Service wrapper produced by [`RateLimit`].
pub struct RateLimitMiddleware<S> {
    service: S,
    limiter: Arc<RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client = client_key(&req);
        let Some(remaining) = self.limiter.allow(&client) else {
            warn!(client = %client, path = %req.path(), "rate limit exceeded");
            return Box::pin(async move { Err(Error::too_many_requests(RATE_LIMIT_MESSAGE).into()) });
        };
        let budget = self.limiter.budget();
        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            let headers = res.response_mut().headers_mut();
            headers.insert(HeaderName::from_static(LIMIT_HEADER), HeaderValue::from(budget));
            headers.insert(
                HeaderName::from_static(REMAINING_HEADER),
                HeaderValue::from(remaining),
            );
            Ok(res)
        })
    }
}
