#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod base;
pub mod debug;
pub mod dispatch;
pub mod endpoints;
pub mod pages;
pub mod projects;

use std::sync::Arc;

use base::BaseClient;

pub use base::SdkError;

pub struct Client {
    pub projects: projects::ProjectClient,
    pub endpoints: endpoints::EndpointClient,
    pub pages: pages::PageClient,
    pub debug: debug::DebugClient,
    pub dispatch: dispatch::DispatchClient,
    base: Arc<BaseClient>,
}

impl Client {
    #[must_use]
    pub fn new(api_url: impl ToString) -> Self {
        let base = Arc::new(BaseClient::new(api_url));
        Self {
            projects: projects::ProjectClient::new(Arc::clone(&base)),
            endpoints: endpoints::EndpointClient::new(Arc::clone(&base)),
            pages: pages::PageClient::new(Arc::clone(&base)),
            debug: debug::DebugClient::new(Arc::clone(&base)),
            dispatch: dispatch::DispatchClient::new(Arc::clone(&base)),
            base,
        }
    }

    pub async fn set_token(&self, token: Option<String>) {
        self.base.set_token(token).await;
    }
}
