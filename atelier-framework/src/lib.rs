#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![deny(clippy::pedantic)]
#![deny(clippy::get_unwrap)]
#![allow(clippy::module_name_repetitions)]

pub mod extract;
mod handler;
mod method_router;
mod router;

pub use handler::Handler;
pub use method_router::*;
pub use router::{Building, Ready, Router};
