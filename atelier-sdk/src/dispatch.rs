use std::sync::Arc;

use serde_json::Value;

use crate::base::{BaseClient, SdkError};

/// Raw access to the dynamic dispatch surface. Unlike the CRUD clients
/// this one never fails on an error status: callers inspect the status
/// code and body themselves.
pub struct DispatchClient {
    base: Arc<BaseClient>,
}

impl DispatchClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    /// `GET` a dynamic endpoint; returns the status and the JSON body
    /// (`Value::Null` when the body is not JSON).
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<(u16, Value), SdkError> {
        let client = reqwest::Client::new();
        let resp = client
            .get(self.base.url(path))
            .query(query)
            .send()
            .await
            .map_err(|err| SdkError {
                status: 0,
                error: format!("{err}"),
            })?;
        let status = resp.status().as_u16();
        let body = resp.json().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    /// `POST` a dynamic endpoint with a JSON body.
    pub async fn post(&self, path: &str, body: &Value) -> Result<(u16, Value), SdkError> {
        let client = reqwest::Client::new();
        let resp = client
            .post(self.base.url(path))
            .json(body)
            .send()
            .await
            .map_err(|err| SdkError {
                status: 0,
                error: format!("{err}"),
            })?;
        let status = resp.status().as_u16();
        let body = resp.json().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    /// `POST` raw (possibly invalid) bytes to a dynamic endpoint.
    pub async fn post_raw(&self, path: &str, body: &str) -> Result<(u16, Value), SdkError> {
        let client = reqwest::Client::new();
        let resp = client
            .post(self.base.url(path))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|err| SdkError {
                status: 0,
                error: format!("{err}"),
            })?;
        let status = resp.status().as_u16();
        let body = resp.json().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    /// Fetch a stored page; returns status, the `Content-Type` header and
    /// the verbatim body.
    pub async fn fetch(&self, path: &str) -> Result<(u16, Option<String>, String), SdkError> {
        let client = reqwest::Client::new();
        let resp = client
            .get(self.base.url(path))
            .send()
            .await
            .map_err(|err| SdkError {
                status: 0,
                error: format!("{err}"),
            })?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let body = resp.text().await.map_err(|err| SdkError {
            status,
            error: format!("{err}"),
        })?;
        Ok((status, content_type, body))
    }
}
