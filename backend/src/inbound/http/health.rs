//! Health endpoints: liveness & readiness probes for orchestration and load
//! balancers, plus a status summary under the API prefix.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use serde_json::json;

use crate::domain::format_timestamp;

/// Shared health state for readiness and liveness checks.
/// Track readiness and whether the process should report itself as alive to orchestrators.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    environment: String,
    clock: Arc<dyn Clock>,
    started_at: DateTime<Utc>,
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new(environment: impl Into<String>) -> Self {
        Self::with_clock(environment, Arc::new(DefaultClock))
    }

    /// Create a health state whose uptime is measured with `clock`.
    pub fn with_clock(environment: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        let started_at = clock.utc();
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            environment: environment.into(),
            clock,
            started_at,
        }
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Return readiness state.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Return liveness state. When false, liveness probes emit 503 to trigger restarts.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn uptime_seconds(&self, now: DateTime<Utc>) -> f64 {
        (now - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Readiness probe. Return 200 when dependencies are initialised and the server can handle traffic; return 503 otherwise.
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe. Return 200 while the process is marked alive and 503 once draining.
/// Call `HealthState::mark_unhealthy` before graceful shutdown to surface the drain early.
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}

/// `GET /api/v1/health`: a human-readable status summary.
#[get("/health")]
pub async fn status(state: web::Data<HealthState>) -> HttpResponse {
    let now = state.clock.utc();
    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(json!({
            "status": "success",
            "message": "Server is running",
            "timestamp": format_timestamp(now),
            "uptime": state.uptime_seconds(now),
            "environment": state.environment,
            "version": env!("CARGO_PKG_VERSION"),
        }))
}
