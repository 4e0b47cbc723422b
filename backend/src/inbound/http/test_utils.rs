//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use chrono::TimeDelta;
use mockable::{Clock, DefaultClock};

use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::persistence::InMemoryDocumentStore;
use crate::test_support::PlainTextHasher;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Services over `store` with plain-text password hashes.
pub fn state_over(store: Arc<InMemoryDocumentStore>, clock: Arc<dyn Clock>) -> HttpState {
    HttpState::new(
        HttpStatePorts {
            store,
            hasher: Arc::new(PlainTextHasher),
            clock,
        },
        TimeDelta::days(90),
    )
}

/// Services over an empty in-memory store.
pub fn in_memory_state(clock: Arc<dyn Clock>) -> HttpState {
    let store = Arc::new(InMemoryDocumentStore::with_default_schemas(Arc::clone(&clock)));
    state_over(store, clock)
}

/// [`in_memory_state`] on the system clock.
pub fn default_state() -> HttpState {
    in_memory_state(Arc::new(DefaultClock))
}

/// The session cookie set by `res`.
///
/// # Panics
/// Panics when the response did not set one.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}
