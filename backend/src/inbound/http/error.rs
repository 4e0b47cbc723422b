//! HTTP rendering of domain errors.
//!
//! Every failure reaches clients through [`normalize`]: the status comes from
//! the error code, and how much is revealed depends on the [`ErrorMode`] and
//! whether the request targeted the JSON API or a page ([`Surface`]).
//! Framework errors that are not domain errors are classified by their
//! status code first.

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError};
use serde_json::{Map, Value, json};
use tracing::{debug, error};

use crate::domain::{Error, ErrorCode, TraceId};

pub use crate::domain::ApiResult;

const UNEXPECTED_API_MESSAGE: &str = "Something went very wrong!";
const UNEXPECTED_VIEW_MESSAGE: &str = "Please try again later.";
const VIEW_TITLE: &str = "Something went wrong";

/// How much of an error is revealed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Development: full payload, cause chain and stack.
    Verbose,
    /// Production: operational messages only; internal failures are masked.
    Restricted,
}

/// Which kind of client the request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// JSON API under `/api`.
    Api,
    /// Anything else; rendered as an HTML page.
    View,
}

impl Surface {
    /// Classify a request path.
    ///
    /// # Examples
    /// ```
    /// use tour_booking::inbound::http::error::Surface;
    ///
    /// assert_eq!(Surface::of_path("/api/v1/tours"), Surface::Api);
    /// assert_eq!(Surface::of_path("/tour/the-forest-hiker"), Surface::View);
    /// ```
    #[must_use]
    pub fn of_path(path: &str) -> Self {
        if path.starts_with("/api") {
            Self::Api
        } else {
            Self::View
        }
    }
}

/// HTTP status for an error code.
#[must_use]
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest | ErrorCode::ValidationFailed | ErrorCode::MalformedId => {
            StatusCode::BAD_REQUEST
        }
        ErrorCode::Unauthorized | ErrorCode::CredentialsExpired => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn status_label(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "error"
    } else {
        "fail"
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn page(status: StatusCode, message: &str) -> HttpResponse {
    let body = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{VIEW_TITLE}</title></head>\n\
         <body><h2>{VIEW_TITLE}</h2><p>{}</p></body>\n</html>\n",
        escape_html(message)
    );
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(body)
}

fn verbose_payload(error: &Error, status: StatusCode) -> Value {
    let mut detail = Map::new();
    detail.insert("code".to_owned(), json!(error.code()));
    detail.insert("message".to_owned(), json!(error.message()));
    detail.insert("statusCode".to_owned(), json!(status.as_u16()));
    detail.insert("isOperational".to_owned(), json!(error.is_operational()));
    let trace_id = error
        .trace_id()
        .map(str::to_owned)
        .or_else(|| TraceId::current().map(|id| id.to_string()));
    if let Some(trace_id) = trace_id {
        detail.insert("traceId".to_owned(), json!(trace_id));
    }
    if let Some(details) = error.details() {
        detail.insert("details".to_owned(), details.clone());
    }
    json!({
        "status": status_label(status),
        "error": detail,
        "message": error.message(),
        "stack": error.stack(),
    })
}

fn render(error: &Error, status: StatusCode, mode: ErrorMode, surface: Surface) -> HttpResponse {
    if error.is_operational() {
        debug!(code = ?error.code(), status = status.as_u16(), message = error.message(), "request failed");
    } else {
        error!(code = ?error.code(), stack = %error.stack(), "unexpected failure");
    }
    match (mode, surface) {
        (ErrorMode::Verbose, Surface::Api) => {
            HttpResponse::build(status).json(verbose_payload(error, status))
        }
        (ErrorMode::Verbose, Surface::View) => page(status, error.message()),
        (ErrorMode::Restricted, Surface::Api) if error.is_operational() => {
            HttpResponse::build(status).json(json!({
                "status": status_label(status),
                "message": error.message(),
            }))
        }
        (ErrorMode::Restricted, Surface::Api) => HttpResponse::InternalServerError().json(json!({
            "status": "error",
            "message": UNEXPECTED_API_MESSAGE,
        })),
        (ErrorMode::Restricted, Surface::View) if error.is_operational() => {
            page(status, error.message())
        }
        (ErrorMode::Restricted, Surface::View) => {
            page(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_VIEW_MESSAGE)
        }
    }
}

/// Render a domain error for `mode` and `surface`.
#[must_use]
pub fn normalize(error: &Error, mode: ErrorMode, surface: Surface) -> HttpResponse {
    render(error, status_for(error.code()), mode, surface)
}

fn code_for_status(status: StatusCode) -> ErrorCode {
    match status {
        StatusCode::UNAUTHORIZED => ErrorCode::Unauthorized,
        StatusCode::FORBIDDEN => ErrorCode::Forbidden,
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::CONFLICT => ErrorCode::Conflict,
        StatusCode::TOO_MANY_REQUESTS => ErrorCode::TooManyRequests,
        StatusCode::SERVICE_UNAVAILABLE => ErrorCode::ServiceUnavailable,
        status if status.is_client_error() => ErrorCode::InvalidRequest,
        _ => ErrorCode::InternalError,
    }
}

/// Render any actix error.
///
/// Domain errors render as with [`normalize`]. Other errors keep their
/// status; below 500 they are operational and show their display message,
/// otherwise they are treated as internal failures.
#[must_use]
pub fn normalize_framework(
    err: &actix_web::Error,
    mode: ErrorMode,
    surface: Surface,
) -> HttpResponse {
    if let Some(domain) = err.as_error::<Error>() {
        return normalize(domain, mode, surface);
    }
    let status = err.as_response_error().status_code();
    let classified = Error::new(code_for_status(status), err.to_string());
    let status = if status.is_client_error() || status.is_server_error() {
        status
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    render(&classified, status, mode, surface)
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        normalize(self, ErrorMode::Restricted, Surface::Api)
    }
}
