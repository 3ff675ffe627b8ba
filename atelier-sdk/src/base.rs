use std::fmt::Display;

use reqwest::RequestBuilder;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;

/// Error surface of the SDK: the HTTP status (0 when the request never
/// reached the server) and the server's public error message.
#[derive(Debug)]
pub struct SdkError {
    pub status: u16,
    pub error: String,
}

impl Display for SdkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status {}: {}", self.status, self.error)
    }
}

impl std::error::Error for SdkError {}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub(crate) struct BaseClient {
    api_url: String,
    token: RwLock<Option<String>>,
}

impl BaseClient {
    pub fn new(api_url: impl ToString) -> Self {
        Self {
            api_url: api_url.to_string(),
            token: RwLock::new(None),
        }
    }

    pub async fn set_token(&self, token: Option<String>) {
        let mut lock = self.token.write().await;
        *lock = token;
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn authorize(&self, rb: RequestBuilder) -> RequestBuilder {
        match self.token.read().await.as_ref() {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    pub(crate) async fn send<T: DeserializeOwned>(rb: RequestBuilder) -> Result<T, SdkError> {
        let resp = rb.send().await.map_err(|err| SdkError {
            status: 0,
            error: format!("{err}"),
        })?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await.map_err(|err| SdkError {
            status,
            error: format!("{err}"),
        })?;

        if (200..300).contains(&status) {
            serde_json::from_slice(&bytes).map_err(|err| SdkError {
                status,
                error: format!("failed to decode response: {err}"),
            })
        } else {
            let error = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|body| body.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).to_string());
            Err(SdkError { status, error })
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: String) -> Result<T, SdkError> {
        let client = reqwest::Client::new();
        let rb = self.authorize(client.get(self.url(&path))).await;
        Self::send(rb).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: String) -> Result<T, SdkError> {
        let client = reqwest::Client::new();
        let rb = self.authorize(client.delete(self.url(&path))).await;
        Self::send(rb).await
    }

    pub(crate) async fn put<T: Serialize, U: DeserializeOwned>(
        &self,
        path: String,
        body: &T,
    ) -> Result<U, SdkError> {
        let client = reqwest::Client::new();
        let rb = self.authorize(client.put(self.url(&path)).json(body)).await;
        Self::send(rb).await
    }

    pub(crate) async fn post<T: Serialize, U: DeserializeOwned>(
        &self,
        path: String,
        body: &T,
    ) -> Result<U, SdkError> {
        let client = reqwest::Client::new();
        let rb = self.authorize(client.post(self.url(&path)).json(body)).await;
        Self::send(rb).await
    }
}
