//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Wraps the Actix cookie session so handlers only persist, read or clear a
//! [`SessionGrant`].

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, SessionGrant};

pub(crate) const GRANT_KEY: &str = "grant";

/// Newtype wrapper that exposes grant-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist a grant in the session cookie, rotating the session.
    ///
    /// # Errors
    /// Returns an internal error when the grant cannot be serialised.
    pub fn persist_grant(&self, grant: &SessionGrant) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(GRANT_KEY, grant)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the grant stored in the session, if any.
    ///
    /// A grant that no longer deserialises is treated as absent.
    pub fn grant(&self) -> Option<SessionGrant> {
        match self.0.get::<SessionGrant>(GRANT_KEY) {
            Ok(grant) => grant,
            Err(error) => {
                warn!(%error, "unreadable session grant");
                None
            }
        }
    }

    /// Drop the session entirely.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
