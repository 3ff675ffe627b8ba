//! Request and response payloads of the CRUD surface, shared between the
//! server handlers and the SDK.

pub mod debug;
pub mod endpoint;
pub mod page;
pub mod project;

use serde::{Deserialize, Serialize};

/// Generic acknowledgement body for update and delete operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Optional project filter accepted by the endpoint and page listings.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}
