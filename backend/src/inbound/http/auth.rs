//! Request guards resolving the logged-in user.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{AuthService, AuthenticatedUser, Error, Role};
use crate::inbound::http::session::SessionContext;

/// The user behind the request's session grant.
///
/// Extraction fails with `401` when there is no valid grant, so handlers
/// taking a `CurrentUser` are only reachable while logged in.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

impl CurrentUser {
    /// Require one of `roles`.
    ///
    /// # Errors
    /// Returns `403` when the user's role is not listed.
    pub fn require(&self, roles: &[Role]) -> Result<(), Error> {
        AuthService::restrict_to(&self.0, roles)
    }
}

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = SessionContext::from_request(req, payload);
        let auth = req.app_data::<web::Data<AuthService>>().cloned();
        Box::pin(async move {
            let auth = auth.ok_or_else(|| Error::internal("authentication service not configured"))?;
            let grant = session.await?.grant();
            let user = auth.authorize(grant).await?;
            Ok(Self(user))
        })
    }
}
