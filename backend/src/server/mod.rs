//! Server construction and middleware wiring.
//!
//! Middleware runs outermost first: trace id, request log, security headers,
//! compression, error rendering, then the routes. Under `/api/v1` requests
//! also pass the rate limiter and the cookie session.

mod logging;
mod session_key;
mod settings;

pub use logging::init_tracing;
pub use session_key::{SessionKeyError, key_fingerprint, load_session_key};
pub use settings::{Environment, ServerSettings, SettingsError};

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::body::MessageBody;
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServerHandle, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::Compress;
use actix_web::{App, HttpServer, web};
use chrono::TimeDelta;
use tracing::info;

use crate::inbound::http::error::ErrorMode;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::inbound::http::{configure_api, route_not_found};
use crate::middleware::{
    ErrorNormalizer, RateLimit, RateLimiter, RequestLog, Trace, security_headers,
};

/// Everything [`build_app`] needs; cheap to clone per worker.
#[derive(Clone)]
pub struct AppDependencies {
    pub health_state: web::Data<HealthState>,
    pub http_state: HttpState,
    pub rate_limiter: Arc<RateLimiter>,
    pub key: Key,
    pub cookie_secure: bool,
    pub session_ttl: TimeDelta,
    pub error_mode: ErrorMode,
    pub body_limit: usize,
}

/// Assemble the application with every route and middleware.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody + 'static>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        rate_limiter,
        key,
        cookie_secure,
        session_ttl,
        error_mode,
        body_limit,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(PersistentSession::default().session_ttl(
            actix_web::cookie::time::Duration::seconds(session_ttl.num_seconds()),
        ))
        .build();

    let api = web::scope("/api/v1")
        .wrap(session)
        .wrap(RateLimit::new(rate_limiter))
        .configure(configure_api);

    App::new()
        .app_data(health_state)
        .app_data(web::JsonConfig::default().limit(body_limit))
        .app_data(web::FormConfig::default().limit(body_limit))
        .configure(|cfg| http_state.configure(cfg))
        .wrap(ErrorNormalizer::new(error_mode))
        .wrap(Compress::default())
        .wrap(security_headers())
        .wrap(RequestLog)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live)
        .default_service(web::to(route_not_found))
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) bind_addr: (String, u16),
    pub(crate) environment: Environment,
    pub(crate) rate_limit: (u32, TimeDelta),
    pub(crate) body_limit: usize,
    pub(crate) session_ttl: TimeDelta,
}

impl ServerConfig {
    /// Derive the server configuration from loaded settings.
    ///
    /// # Errors
    /// Returns [`SettingsError`] when a setting is out of range.
    pub fn from_settings(settings: &ServerSettings, key: Key) -> Result<Self, SettingsError> {
        Ok(Self {
            key,
            cookie_secure: settings.cookie_secure,
            bind_addr: settings.bind_addr(),
            environment: settings.environment()?,
            rate_limit: (settings.rate_limit_max()?, settings.rate_limit_window()?),
            body_limit: settings.body_limit_bytes(),
            session_ttl: settings.session_ttl()?,
        })
    }

    /// Session lifetime, shared by the cookie and the authorisation check.
    #[must_use]
    pub fn session_ttl(&self) -> TimeDelta {
        self.session_ttl
    }
}

/// Construct an Actix HTTP server over the given ports.
///
/// Signals are left to [`run_until_shutdown`] so probes can fail before the
/// server drains.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
    ports: HttpStatePorts,
) -> std::io::Result<Server> {
    let ServerConfig {
        key,
        cookie_secure,
        bind_addr,
        environment,
        rate_limit: (budget, window),
        body_limit,
        session_ttl,
    } = config;
    let rate_limiter = Arc::new(RateLimiter::new(budget, window, Arc::clone(&ports.clock)));
    let deps = AppDependencies {
        health_state: health_state.clone(),
        http_state: HttpState::new(ports, session_ttl),
        rate_limiter,
        key,
        cookie_secure,
        session_ttl,
        error_mode: environment.error_mode(),
        body_limit,
    };

    let server = HttpServer::new(move || build_app(deps.clone()))
        .disable_signals()
        .bind((bind_addr.0.as_str(), bind_addr.1))?
        .run();

    info!(
        host = %bind_addr.0,
        port = bind_addr.1,
        environment = environment.as_str(),
        "server listening"
    );
    health_state.mark_ready();
    Ok(server)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = terminate.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn watch_for_shutdown(handle: ServerHandle, health_state: web::Data<HealthState>) {
    actix_web::rt::spawn(async move {
        shutdown_signal().await;
        info!("shutdown requested; draining connections");
        health_state.mark_unhealthy();
        handle.stop(true).await;
    });
}

/// Drive `server` until SIGTERM or Ctrl-C, marking the process unhealthy
/// before connections drain.
///
/// # Errors
/// Propagates server I/O failures.
pub async fn run_until_shutdown(
    server: Server,
    health_state: web::Data<HealthState>,
) -> std::io::Result<()> {
    watch_for_shutdown(server.handle(), health_state);
    server.await
}
