use std::sync::Arc;

use atelier_types::methods::debug::RoutesResponse;

use crate::base::{BaseClient, SdkError};

pub struct DebugClient {
    base: Arc<BaseClient>,
}

impl DebugClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn routes(&self) -> Result<RoutesResponse, SdkError> {
        self.base.get("/api/debug/routes".to_string()).await
    }
}
