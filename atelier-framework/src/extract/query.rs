use std::ops::Deref;

use atelier_types::error::ApiError;
use serde::de::DeserializeOwned;

use super::{FromRequest, Request};

/// Optional query-string filters on the listing routes (`projectId=`).
///
/// Listings are valid without any filter, so a request with no query
/// string extracts the filter type's default instead of failing.
#[derive(Debug)]
pub struct Query<T>(pub T);

impl<T> Deref for Query<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> FromRequest for Query<T>
where
    T: DeserializeOwned + Default,
{
    fn from_request(req: &mut Request) -> Result<Self, ApiError> {
        if req.query_string.is_empty() {
            return Ok(Query(T::default()));
        }
        serde_qs::from_str(&req.query_string)
            .map(Query)
            .map_err(|_| ApiError::bad_request_message("Invalid query string"))
    }
}
