//! Renders every failed request through the error normaliser.
//!
//! Handlers and inner middleware fail with domain or framework errors; this
//! middleware replaces the default rendering with the one chosen by the
//! configured [`ErrorMode`] and the request's [`Surface`].

use std::task::{Context, Poll};

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use futures_util::future::{LocalBoxFuture, Ready, ready};

use crate::inbound::http::error::{ErrorMode, Surface, normalize_framework};

/// Error-rendering middleware.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use tour_booking::inbound::http::error::ErrorMode;
/// use tour_booking::middleware::ErrorNormalizer;
///
/// let app = App::new().wrap(ErrorNormalizer::new(ErrorMode::Restricted));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ErrorNormalizer {
    mode: ErrorMode,
}

impl ErrorNormalizer {
    /// Render errors in `mode`.
    #[must_use]
    pub fn new(mode: ErrorMode) -> Self {
        Self { mode }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ErrorNormalizer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = ErrorNormalizerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorNormalizerMiddleware {
            service,
            mode: self.mode,
        }))
    }
}

/// Service wrapper produced by [`ErrorNormalizer`].
pub struct ErrorNormalizerMiddleware<S> {
    service: S,
    mode: ErrorMode,
}

impl<S, B> Service<ServiceRequest> for ErrorNormalizerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let request = req.request().clone();
        let mode = self.mode;
        let fut = self.service.call(req);
        Box::pin(async move {
            let surface = Surface::of_path(request.path());
            match fut.await {
                Ok(res) => {
                    let rendered = res
                        .response()
                        .error()
                        .map(|error| normalize_framework(error, mode, surface));
                    Ok(match rendered {
                        Some(response) => res.into_response(response),
                        None => res.map_into_boxed_body(),
                    })
                }
                Err(error) => Ok(ServiceResponse::new(
                    request,
                    normalize_framework(&error, mode, surface),
                )),
            }
        })
    }
}
