use std::{collections::HashMap, str::FromStr};

use bytes::Bytes;
use http::{Extensions, Method};
use http_body::Limited;
use hyper::Body;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Operation is the request verb after translation from the HTTP method.
/// Dynamic endpoints only ever see `Get` and `Post`; the CRUD surface
/// uses all four.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Get,
    Post,
    Put,
    Delete,
}

impl FromStr for Operation {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &s.to_lowercase()[..] {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            _ => Err(ApiError::bad_request()),
        }
    }
}

/// Request stores the parameters and context of one HTTP request after it
/// has been lifted out of hyper. It abstracts the wire protocol away from
/// the route handlers and the dispatcher.
#[derive(Debug)]
pub struct Request {
    /// Uuid associated with each request, for log correlation.
    pub id: Uuid,

    pub operation: Operation,

    pub path: String,

    pub data: Bytes,
    pub query_string: String,
    pub extensions: Extensions,
    /// Positional parameters captured by the static route table.
    pub params: Vec<String>,
    /// Bearer token from the `Authorization` header, if any.
    pub token: Option<String>,

    pub headers: HashMap<String, String>,
}

impl Request {
    /// Create an internal logical request from a http request.
    ///
    /// # Errors
    ///
    /// Returns an error if the http request uses an unsupported method or
    /// the body cannot be read.
    pub async fn new(raw: hyper::Request<Limited<Body>>) -> Result<Self, ApiError> {
        let uri = raw.uri().clone();
        let token = raw
            .headers()
            .get(http::header::AUTHORIZATION)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.strip_prefix("Bearer "))
            .and_then(|token| {
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            });
        let headers = raw
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        let operation = match *raw.method() {
            Method::GET => Operation::Get,
            Method::POST => Operation::Post,
            Method::PUT => Operation::Put,
            Method::DELETE => Operation::Delete,
            _ => return Err(ApiError::bad_request()),
        };

        let bytes = hyper::body::to_bytes(raw.into_body())
            .await
            .map_err(|_| ApiError::bad_request())?;

        Ok(Self {
            id: Uuid::new_v4(),
            operation,
            query_string: uri.query().unwrap_or_default().to_string(),
            path: uri.path().to_string(),
            extensions: Extensions::new(),
            token,
            params: vec![],
            data: bytes,
            headers,
        })
    }

    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    // Builder methods used by tests and internal callers.
    #[must_use]
    pub fn internal() -> Self {
        Self {
            id: Uuid::default(),
            operation: Operation::Get,
            path: String::default(),
            data: Bytes::default(),
            query_string: String::default(),
            extensions: Extensions::new(),
            params: Vec::default(),
            token: None,
            headers: HashMap::default(),
        }
    }

    #[must_use]
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: &impl ToString) -> Self {
        self.path = path.to_string();
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = data;
        self
    }
}
