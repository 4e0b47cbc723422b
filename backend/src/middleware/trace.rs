//! Tracing middleware attaching a request-scoped trace identifier.
//!
//! Each incoming request receives a [`TraceId`] stored in task-local storage
//! for correlation across logs and error responses. A well-formed UUID in an
//! inbound `trace-id` header is reused so calls can be followed across
//! services.

use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::error;

use crate::domain::TraceId;

/// Request and response header carrying the trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Tracing middleware attaching a request-scoped UUID and
/// adding a `trace-id` header to every response.
///
/// Handlers can read the trace ID via [`TraceId::current`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use tour_booking::middleware::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Clone)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service wrapper produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let upstream = req
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok());
        let trace_id = TraceId::from_upstream(upstream);
        let header_value = trace_id.to_string();
        let fut = self.service.call(req);
        Box::pin(TraceId::scope(trace_id, async move {
            let mut res = fut.await?;
            match HeaderValue::from_str(&header_value) {
                Ok(value) => {
                    res.response_mut()
                        .headers_mut()
                        .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                }
                Err(error) => {
                    error!(
                        %error,
                        trace_id = %trace_id,
                        "failed to encode trace identifier header"
                    );
                }
            }
            Ok(res)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test, web};

    async fn call_with(upstream: Option<&str>) -> (String, String) {
        let app = test::init_service(App::new().wrap(Trace).route(
            "/",
            web::get().to(|| async move {
                let id = TraceId::current().expect("trace id in scope");
                HttpResponse::Ok().body(id.to_string())
            }),
        ))
        .await;
        let mut req = test::TestRequest::get().uri("/");
        if let Some(value) = upstream {
            req = req.insert_header((TRACE_ID_HEADER, value));
        }
        let res = test::call_service(&app, req.to_request()).await;
        let header = res
            .headers()
            .get(TRACE_ID_HEADER)
            .expect("trace id header")
            .to_str()
            .expect("header is ascii")
            .to_owned();
        let body = test::read_body(res).await;
        let body = std::str::from_utf8(&body).expect("utf8 body").to_owned();
        (header, body)
    }

    #[actix_web::test]
    async fn exposes_trace_id_in_handler() {
        let (header, body) = call_with(None).await;
        assert_eq!(header, body);
        assert!(header.parse::<TraceId>().is_ok());
    }

    #[actix_web::test]
    async fn reuses_upstream_identifier() {
        let upstream = "00000000-0000-0000-0000-000000000001";
        let (header, body) = call_with(Some(upstream)).await;
        assert_eq!(header, upstream);
        assert_eq!(body, upstream);
    }

    #[actix_web::test]
    async fn replaces_malformed_upstream_identifier() {
        let (header, _) = call_with(Some("not-a-uuid")).await;
        assert_ne!(header, "not-a-uuid");
        assert!(header.parse::<TraceId>().is_ok());
    }
}
