//! Domain-level error types.
//!
//! These errors are transport agnostic. Every failure is tagged with an
//! [`ErrorCode`] at the point where it happens; inbound adapters map the code
//! to HTTP statuses and decide how much of the error to reveal.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::TraceId;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed.
    InvalidRequest,
    /// One or more fields break a schema constraint.
    ValidationFailed,
    /// An identifier or typed value could not be parsed.
    MalformedId,
    /// Authentication failed or is missing.
    Unauthorized,
    /// The presented credentials were valid once but have expired.
    CredentialsExpired,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// The write collides with a unique constraint.
    Conflict,
    /// The caller exceeded its request budget.
    TooManyRequests,
    /// A backing service is unreachable.
    ServiceUnavailable,
    /// An unexpected error occurred inside the application.
    InternalError,
}

impl ErrorCode {
    /// Whether errors with this code are anticipated and safe to show to
    /// clients verbatim.
    #[must_use]
    pub const fn is_operational(self) -> bool {
        !matches!(self, Self::InternalError)
    }
}

/// Domain error payload.
///
/// Besides the code and message, an error keeps the chain of lower-level
/// causes and, for internal errors, a captured backtrace. Both feed
/// [`Error::stack`], which is only ever shown in verbose mode.
///
/// # Examples
/// ```
/// use tour_booking::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("No tour found with that ID");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert!(err.is_operational());
/// ```
#[derive(Debug, Clone)]
pub struct Error {
    code: ErrorCode,
    message: String,
    trace_id: Option<String>,
    details: Option<Value>,
    causes: Vec<String>,
    backtrace: Option<Arc<Backtrace>>,
}

impl Error {
    /// Create a new error.
    ///
    /// Captures the current trace identifier if one is in scope so the error
    /// payload is correlated automatically. Internal errors also capture a
    /// backtrace, subject to `RUST_BACKTRACE`.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let backtrace = (!code.is_operational()).then(|| Arc::new(Backtrace::capture()));
        Self {
            code,
            message: message.into(),
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
            causes: Vec::new(),
            backtrace,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Correlation identifier captured when the error was created.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Supplementary error details for adapters.
    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Lower-level failures that led to this error, outermost first.
    #[must_use]
    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    /// Whether the error is anticipated and safe to show verbatim.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.code.is_operational()
    }

    /// Attach a trace identifier to the error.
    #[must_use]
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use tour_booking::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::invalid_request("bad")
    ///     .with_details(json!({ "field": "name" }));
    /// assert!(err.details().is_some());
    /// ```
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Record the lower-level failure behind this error.
    #[must_use]
    pub fn with_cause(mut self, cause: &dyn std::error::Error) -> Self {
        self.causes.push(cause.to_string());
        let mut source = cause.source();
        while let Some(inner) = source {
            self.causes.push(inner.to_string());
            source = inner.source();
        }
        self
    }

    /// Diagnostic text listing the error, its causes and the backtrace when
    /// one was captured.
    ///
    /// Never empty.
    #[must_use]
    pub fn stack(&self) -> String {
        let mut stack = format!("Error [{}]: {}", code_label(self.code), self.message);
        for cause in &self.causes {
            stack.push_str(&format!("\n    caused by: {cause}"));
        }
        if let Some(backtrace) = self
            .backtrace
            .as_deref()
            .filter(|bt| bt.status() == BacktraceStatus::Captured)
        {
            stack.push_str(&format!("\n{backtrace}"));
        }
        stack
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::ValidationFailed`].
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Convenience constructor for [`ErrorCode::MalformedId`].
    pub fn malformed_id(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedId, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::CredentialsExpired`].
    pub fn credentials_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CredentialsExpired, message)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::TooManyRequests`].
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TooManyRequests, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

fn code_label(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::InvalidRequest => "invalid_request",
        ErrorCode::ValidationFailed => "validation_failed",
        ErrorCode::MalformedId => "malformed_id",
        ErrorCode::Unauthorized => "unauthorized",
        ErrorCode::CredentialsExpired => "credentials_expired",
        ErrorCode::Forbidden => "forbidden",
        ErrorCode::NotFound => "not_found",
        ErrorCode::Conflict => "conflict",
        ErrorCode::TooManyRequests => "too_many_requests",
        ErrorCode::ServiceUnavailable => "service_unavailable",
        ErrorCode::InternalError => "internal_error",
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}
