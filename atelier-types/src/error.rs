use std::fmt::Display;

use http::header::CONTENT_TYPE;
use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};
use thiserror::Error;

pub use http::StatusCode;
use tracing_error::SpanTrace;

/// A shared error type used to produce the public error body and carry
/// additional context for internal diagnostics. The public body is built
/// from the inner error's [`Display`] implementation, the `status_code`
/// field, and the optional `details` field. The internal error report is
/// created from the [`Debug`] implementation and `span_trace` field.
#[serde_as]
#[derive(Error, Debug, Serialize)]
pub struct ApiError {
    // Only the Display format of the source error is returned to the client.
    #[serde_as(as = "DisplayFromStr")]
    #[source]
    pub error: anyhow::Error,
    /// Extra public context for sandbox failures. Guest error messages are
    /// data, not internals, so they may travel to the caller here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip)]
    pub status_code: StatusCode,
    #[serde(skip)]
    pub span_trace: Option<SpanTrace>,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let report = self.report();
        write!(f, "{report:?}")
    }
}

#[derive(Debug)]
pub struct Report {
    pub cause: String,
    pub span_trace: Option<SpanTrace>,
}

impl ApiError {
    fn new(message: &'static str, status_code: StatusCode) -> Self {
        Self {
            error: anyhow::Error::msg(message),
            details: None,
            status_code,
            span_trace: Some(SpanTrace::capture()),
        }
    }

    #[must_use]
    pub fn bad_request() -> Self {
        Self::new("Bad request", StatusCode::BAD_REQUEST)
    }

    /// A 400 whose public message says what was wrong with the request.
    #[must_use]
    pub fn bad_request_message(message: &'static str) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    #[must_use]
    pub fn internal_error() -> Self {
        Self::new("Internal error", StatusCode::INTERNAL_SERVER_ERROR)
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(
            "User is not authorized to perform this operation",
            StatusCode::UNAUTHORIZED,
        )
    }

    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(
            "User does not have access to this resource",
            StatusCode::FORBIDDEN,
        )
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new("Not found", StatusCode::NOT_FOUND)
    }

    #[must_use]
    pub fn invalid_json_body() -> Self {
        Self::new("Invalid JSON body", StatusCode::BAD_REQUEST)
    }

    #[must_use]
    pub fn endpoint_timeout() -> Self {
        Self::new("Endpoint timed out", StatusCode::GATEWAY_TIMEOUT)
    }

    /// Guest code failed while handling a dispatched request. The sandbox
    /// message is carried in `details` so the owner can see what broke.
    #[must_use]
    pub fn execution_error(details: String) -> Self {
        let mut err = Self::new("Error executing endpoint", StatusCode::INTERNAL_SERVER_ERROR);
        err.details = Some(details);
        err
    }

    #[must_use]
    pub fn report(&self) -> Report {
        Report {
            cause: format!("{:?}", self.error.root_cause()),
            span_trace: self.span_trace.clone(),
        }
    }
}

impl From<ApiError> for hyper::Response<hyper::Body> {
    fn from(err: ApiError) -> Self {
        match serde_json::to_vec(&err) {
            Ok(err_body) => hyper::Response::builder()
                .header(CONTENT_TYPE, "application/json")
                .status(err.status_code)
                .body(err_body.into())
                .expect("a valid response"),
            Err(_) => hyper::Response::builder()
                .header(CONTENT_TYPE, "application/json")
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal error. Unable to return the error response.".into())
                .expect("a valid response"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_api_error() {
        let err = ApiError::not_found();
        let serialized = serde_json::to_string(&err).unwrap();
        assert_eq!(serialized, r#"{"error":"Not found"}"#);
    }

    #[test]
    fn serialize_api_error_with_details() {
        let err = ApiError::execution_error("ReferenceError: x is not defined".into());
        let serialized = serde_json::to_string(&err).unwrap();
        assert_eq!(
            serialized,
            r#"{"error":"Error executing endpoint","details":"ReferenceError: x is not defined"}"#
        );
        assert_eq!(err.status_code, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
