use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, request::Operation};

/// Guest language of a dynamic endpoint handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Python,
}

impl Language {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Javascript => "javascript",
            Self::Python => "python",
        }
    }

    /// Human-facing name, used in error payloads shown to endpoint owners.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Javascript => "JavaScript",
            Self::Python => "Python",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::Javascript
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "javascript" => Ok(Self::Javascript),
            "python" => Ok(Self::Python),
            _ => Err(ApiError::bad_request()),
        }
    }
}

/// HTTP method a dynamic endpoint is dispatched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }

    #[must_use]
    pub fn matches(self, operation: Operation) -> bool {
        matches!(
            (self, operation),
            (Self::Get, Operation::Get) | (Self::Post, Operation::Post)
        )
    }
}

impl Default for HttpMethod {
    fn default() -> Self {
        Self::Get
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            _ => Err(ApiError::bad_request()),
        }
    }
}

/// Derive the URL slug of a project name: lowercased, with every run of
/// whitespace collapsed to a single `-`.
#[must_use]
pub fn name_slug(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// A user-owned namespace that groups endpoints and pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    /// Derived from `name`, never stored.
    pub name_slug: String,
}

impl Project {
    #[must_use]
    pub fn new(user_id: String, name: String, description: Option<String>) -> Self {
        let name_slug = name_slug(&name);
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            user_id,
            created_at: Utc::now(),
            name_slug,
        }
    }
}

/// A dynamic handler exposed at a unique URL path under `/api/<slug>/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub id: String,
    pub path: String,
    pub parameters: Vec<String>,
    pub code: String,
    pub language: Language,
    pub http_method: HttpMethod,
    pub project_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    /// Display fields joined from the owning user / project rows. Optional
    /// so partial rows never fail decoding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

/// A stored HTML document served verbatim at a unique URL path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub path: String,
    pub html_content: String,
    pub project_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}
