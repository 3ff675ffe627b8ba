use std::sync::Arc;

use atelier_types::{
    entity::Page,
    methods::{
        page::{CreatePageParams, UpdatePageParams},
        MessageResponse,
    },
};

use crate::base::{BaseClient, SdkError};

pub struct PageClient {
    base: Arc<BaseClient>,
}

impl PageClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn create(&self, params: &CreatePageParams) -> Result<Page, SdkError> {
        self.base.post("/api/pages".to_string(), params).await
    }

    pub async fn list(&self, project_id: Option<&str>) -> Result<Vec<Page>, SdkError> {
        let path = match project_id {
            Some(project_id) => format!("/api/pages?projectId={project_id}"),
            None => "/api/pages".to_string(),
        };
        self.base.get(path).await
    }

    pub async fn get(&self, id: &str) -> Result<Page, SdkError> {
        self.base.get(format!("/api/pages/{id}")).await
    }

    pub async fn update(
        &self,
        id: &str,
        params: &UpdatePageParams,
    ) -> Result<MessageResponse, SdkError> {
        self.base.put(format!("/api/pages/{id}"), params).await
    }

    pub async fn remove(&self, id: &str) -> Result<MessageResponse, SdkError> {
        self.base.delete(format!("/api/pages/{id}")).await
    }
}
