use std::fmt::Display;

use atelier_types::error::{ApiError, StatusCode};
use sqlx::error::DatabaseError;
use sqlx::sqlite::SqliteError;
use thiserror::Error;
use tracing_error::SpanTrace;

#[derive(Error, Debug)]
pub enum ErrorType {
    #[error("Internal error")]
    Storage(sqlx::Error),
    #[error("Internal error")]
    Internal(anyhow::Error),
    #[error("Internal error")]
    BadData(String),
    #[error("Internal error")]
    BadResponseData(#[source] serde_json::Error),
    #[error("Internal error")]
    Migration {
        filename: String,
        #[source]
        error: sqlx::Error,
    },
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("An endpoint or page is already registered at `{path}`")]
    PathConflict { path: String },
    #[error("`{path}` collides with a reserved system route")]
    ReservedPath { path: String },
    #[error("Pages may not live under `/api/` (got `{path}`)")]
    PageUnderApi { path: String },
    #[error("A resource with that identifier already exists")]
    UniqueConstraintViolation {
        #[source]
        error: sqlx::Error,
    },
    #[error("The resource update was not processable")]
    ForeignKeyViolation {
        #[source]
        error: sqlx::Error,
    },
}

#[derive(Error, Debug)]
pub struct Error {
    pub variant: ErrorType,
    pub span_trace: SpanTrace,
}

impl Error {
    /// True when the underlying store rejected the write because the path
    /// (or id) is already taken.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self.variant, ErrorType::UniqueConstraintViolation { .. })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.variant, self.span_trace)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        #[allow(clippy::redundant_closure_for_method_calls)]
        if let Some(error_code) = err
            .as_database_error()
            .and_then(|db_err| db_err.try_downcast_ref::<SqliteError>())
        {
            if let Some(code) = error_code.code().map(|str| str.to_string()) {
                match &code[..] {
                    // FK constraint violation
                    "787" => {
                        return Self {
                            variant: ErrorType::ForeignKeyViolation { error: err },
                            span_trace: SpanTrace::capture(),
                        };
                    }
                    // UNIQUE constraint violation (primary key / column)
                    "1555" | "2067" => {
                        return Self {
                            variant: ErrorType::UniqueConstraintViolation { error: err },
                            span_trace: SpanTrace::capture(),
                        };
                    }
                    _ => {}
                }
            }
        }
        Self {
            variant: ErrorType::Storage(err),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl From<ErrorType> for Error {
    fn from(err: ErrorType) -> Self {
        Self {
            variant: err,
            span_trace: SpanTrace::capture(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status_code = match err.variant {
            ErrorType::Storage(_)
            | ErrorType::Internal(_)
            | ErrorType::BadData(_)
            | ErrorType::BadResponseData(_)
            | ErrorType::Migration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorType::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ErrorType::Forbidden(_) => StatusCode::FORBIDDEN,
            ErrorType::NotFound(_) => StatusCode::NOT_FOUND,
            ErrorType::BadRequest(_)
            | ErrorType::ReservedPath { .. }
            | ErrorType::PageUnderApi { .. } => StatusCode::BAD_REQUEST,
            ErrorType::PathConflict { .. } | ErrorType::UniqueConstraintViolation { .. } => {
                StatusCode::CONFLICT
            }
            ErrorType::ForeignKeyViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };

        ApiError {
            error: err.variant.into(),
            details: None,
            status_code,
            span_trace: Some(err.span_trace),
        }
    }
}
