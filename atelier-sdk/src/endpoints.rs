use std::sync::Arc;

use atelier_types::{
    entity::Endpoint,
    methods::{
        endpoint::{CreateEndpointParams, UpdateEndpointParams},
        MessageResponse,
    },
};

use crate::base::{BaseClient, SdkError};

pub struct EndpointClient {
    base: Arc<BaseClient>,
}

impl EndpointClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn create(&self, params: &CreateEndpointParams) -> Result<Endpoint, SdkError> {
        self.base.post("/api/endpoints".to_string(), params).await
    }

    pub async fn list(&self, project_id: Option<&str>) -> Result<Vec<Endpoint>, SdkError> {
        let path = match project_id {
            Some(project_id) => format!("/api/endpoints?projectId={project_id}"),
            None => "/api/endpoints".to_string(),
        };
        self.base.get(path).await
    }

    pub async fn get(&self, id: &str) -> Result<Endpoint, SdkError> {
        self.base.get(format!("/api/endpoints/{id}")).await
    }

    pub async fn update(
        &self,
        id: &str,
        params: &UpdateEndpointParams,
    ) -> Result<MessageResponse, SdkError> {
        self.base.put(format!("/api/endpoints/{id}"), params).await
    }

    pub async fn remove(&self, id: &str) -> Result<MessageResponse, SdkError> {
        self.base.delete(format!("/api/endpoints/{id}")).await
    }
}
