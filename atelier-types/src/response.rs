use http::{header::CONTENT_TYPE, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Response from a route handler or the dispatcher.
#[derive(Debug)]
pub enum Response {
    /// JSON payload returned as is to the client.
    Json { status: StatusCode, body: Value },
    /// Stored page body, served verbatim as HTML.
    Html { status: StatusCode, body: String },
}

impl Response {
    /// Construct a `200 OK` response with a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if it fails to serialize the payload.
    pub fn raw<T: Serialize>(data: T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(data).map(|body| Self::Json {
            status: StatusCode::OK,
            body,
        })
    }

    /// Construct a `201 Created` response with a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if it fails to serialize the payload.
    pub fn created<T: Serialize>(data: T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(data).map(|body| Self::Json {
            status: StatusCode::CREATED,
            body,
        })
    }

    #[must_use]
    pub fn json_value(status: StatusCode, body: Value) -> Self {
        Self::Json { status, body }
    }

    #[must_use]
    pub fn html(body: String) -> Self {
        Self::Html {
            status: StatusCode::OK,
            body,
        }
    }
}

impl From<Response> for hyper::Response<hyper::Body> {
    fn from(resp: Response) -> Self {
        match resp {
            Response::Json { status, body } => match serde_json::to_vec(&body) {
                Ok(body) => match hyper::Response::builder()
                    .status(status)
                    .header(CONTENT_TYPE, "application/json")
                    .body(body.into())
                {
                    Ok(resp) => resp,
                    Err(_) => ApiError::internal_error().into(),
                },
                Err(_) => ApiError::internal_error().into(),
            },
            Response::Html { status, body } => match hyper::Response::builder()
                .status(status)
                .header(CONTENT_TYPE, "text/html; charset=utf-8")
                .body(body.into())
            {
                Ok(resp) => resp,
                Err(_) => ApiError::internal_error().into(),
            },
        }
    }
}
