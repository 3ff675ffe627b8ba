use atelier_types::{auth::Identity, error::ApiError, request::Request};

use super::FromRequest;

// The auth layer inserts an `Identity` extension after verifying the
// bearer token. Handlers that take `Identity` as an argument therefore
// reject unauthenticated callers before touching any state.
impl FromRequest for Identity {
    #[tracing::instrument(level = "debug", name = "identity_extractor", skip_all)]
    fn from_request(req: &mut Request) -> Result<Self, ApiError> {
        req.extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(ApiError::unauthorized)
    }
}
