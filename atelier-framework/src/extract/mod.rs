mod identity;
mod json;
mod path;
mod query;
mod state;

use atelier_types::{error::ApiError, request::Request};
pub use json::*;
pub use path::*;
pub use query::*;
pub use state::*;

pub trait FromRequest: Sized {
    /// Perform the extraction.
    ///
    /// # Errors
    ///
    /// Returns error if the extraction from the [`Request`] was unsuccessful.
    fn from_request(req: &mut Request) -> Result<Self, ApiError>;
}
