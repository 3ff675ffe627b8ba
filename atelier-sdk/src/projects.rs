use std::sync::Arc;

use atelier_types::{
    entity::Project,
    methods::{
        project::{CreateProjectParams, UpdateProjectParams},
        MessageResponse,
    },
};

use crate::base::{BaseClient, SdkError};

pub struct ProjectClient {
    base: Arc<BaseClient>,
}

impl ProjectClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn create(&self, params: &CreateProjectParams) -> Result<Project, SdkError> {
        self.base.post("/api/projects".to_string(), params).await
    }

    pub async fn list(&self) -> Result<Vec<Project>, SdkError> {
        self.base.get("/api/projects".to_string()).await
    }

    pub async fn get(&self, id: &str) -> Result<Project, SdkError> {
        self.base.get(format!("/api/projects/{id}")).await
    }

    pub async fn update(
        &self,
        id: &str,
        params: &UpdateProjectParams,
    ) -> Result<MessageResponse, SdkError> {
        self.base.put(format!("/api/projects/{id}"), params).await
    }

    pub async fn remove(&self, id: &str) -> Result<MessageResponse, SdkError> {
        self.base.delete(format!("/api/projects/{id}")).await
    }
}
