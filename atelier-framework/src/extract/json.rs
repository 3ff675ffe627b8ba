use std::ops::Deref;

use atelier_types::error::ApiError;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{FromRequest, Request};

/// The request body, decoded as one of the CRUD parameter payloads.
///
/// Every mutating operation on this surface takes a JSON object body, so
/// decoding happens in two steps: bytes that are not JSON at all produce
/// the same `Invalid JSON body` answer the dynamic dispatch surface
/// gives, while well-formed JSON of the wrong shape is reported as an
/// invalid payload.
#[derive(Debug)]
pub struct Json<T>(pub T);

impl<T> Deref for Json<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned> FromRequest for Json<T> {
    fn from_request(req: &mut Request) -> Result<Self, ApiError> {
        if req.data.is_empty() {
            return Err(ApiError::invalid_json_body());
        }
        let value: serde_json::Value =
            serde_json::from_slice(&req.data).map_err(|_| ApiError::invalid_json_body())?;

        serde_json::from_value(value).map(Json).map_err(|err| {
            debug!(
                payload = std::any::type_name::<T>(),
                %err,
                "request body does not match the expected payload"
            );
            ApiError::bad_request_message("Invalid request payload")
        })
    }
}
