use std::{collections::HashMap, sync::Arc, time::Duration};

use atelier_types::{
    error::{ApiError, StatusCode},
    request::{Operation, Request},
    response::Response,
};
use bytes::Bytes;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tower::Service;
use tracing::warn;

use crate::{
    path::normalize_path,
    registry::{EndpointRoute, Registry, RouteInfo},
    repos::Repos,
};

/// HTTP entry point for every path the static router does not own: looks
/// the canonical path up in the registry and either invokes the stored
/// handler, serves the stored page, or reports `Not found`.
pub struct DispatchService {
    registry: Arc<Registry>,
    repos: Repos,
    handler_timeout: Duration,
}

impl Clone for DispatchService {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            repos: self.repos.clone(),
            handler_timeout: self.handler_timeout,
        }
    }
}

impl DispatchService {
    #[must_use]
    pub fn new(registry: Arc<Registry>, repos: Repos, handler_timeout: Duration) -> Self {
        Self {
            registry,
            repos,
            handler_timeout,
        }
    }

    #[tracing::instrument(
        skip(self, req),
        fields(
            path = req.path,
            operation = ?req.operation
        )
    )]
    async fn dispatch(&self, req: Request) -> Result<Response, ApiError> {
        self.registry
            .ensure_initialized()
            .await
            .map_err(ApiError::from)?;

        let path = normalize_path(&req.path);
        if let Some(route) = self.registry.lookup(&path).await {
            match route.as_ref() {
                RouteInfo::Endpoint(endpoint) if endpoint.method.matches(req.operation) => {
                    return self.invoke_endpoint(endpoint, &req).await;
                }
                RouteInfo::Page(page) => {
                    return Ok(Response::html(page.html_content.clone()));
                }
                // Method mismatch falls through to the page check below.
                RouteInfo::Endpoint(_) => {}
            }
        }

        // A page written to the store between initialization windows is
        // still served, straight from the store.
        if let Some(page) = self
            .repos
            .page
            .get_by_path(&path)
            .await
            .map_err(ApiError::from)?
        {
            return Ok(Response::html(page.html_content));
        }

        Err(ApiError::not_found())
    }

    async fn invoke_endpoint(
        &self,
        endpoint: &EndpointRoute,
        req: &Request,
    ) -> Result<Response, ApiError> {
        let params = match req.operation {
            Operation::Get => query_params(&endpoint.parameters, &req.query_string),
            _ => decode_json_body(&req.data)?,
        };

        // The invocation holds its own reference to the handler, so a
        // concurrent update or delete cannot tear the sandbox down under
        // a running call.
        let handler = Arc::clone(&endpoint.handler);
        match tokio::time::timeout(self.handler_timeout, handler.invoke(params)).await {
            Ok(Ok(value)) => Ok(Response::json_value(StatusCode::OK, value)),
            Ok(Err(error)) => {
                warn!(path = endpoint.path, %error, "endpoint execution failed");
                Err(ApiError::execution_error(error.to_string()))
            }
            Err(_) => {
                // The guest cannot always be cancelled; the execution is
                // abandoned and its eventual result discarded.
                warn!(path = endpoint.path, "endpoint exceeded its execution budget");
                Err(ApiError::endpoint_timeout())
            }
        }
    }
}

/// `GET` parameters: each declared name is read from the query string,
/// missing names map to `null`. Query values stay strings; no coercion.
fn query_params(declared: &[String], query_string: &str) -> Map<String, Value> {
    let values: HashMap<String, String> = serde_qs::from_str(query_string).unwrap_or_default();
    declared
        .iter()
        .map(|name| {
            let value = values
                .get(name)
                .map_or(Value::Null, |value| Value::String(value.clone()));
            (name.clone(), value)
        })
        .collect()
}

/// `POST` parameters: the body must be a JSON object. An empty body means
/// no parameters.
fn decode_json_body(data: &Bytes) -> Result<Map<String, Value>, ApiError> {
    if data.is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_slice(data).map_err(|_| ApiError::invalid_json_body())
}

impl Service<Request> for DispatchService {
    type Response = Response;

    type Error = ApiError;

    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { this.dispatch(req).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_values_are_strings_and_missing_names_are_null() {
        let declared = vec!["a".to_string(), "b".to_string()];
        let params = query_params(&declared, "a=5");
        assert_eq!(params["a"], Value::String("5".into()));
        assert_eq!(params["b"], Value::Null);
    }

    #[test]
    fn undeclared_query_values_are_ignored() {
        let declared = vec!["a".to_string()];
        let params = query_params(&declared, "a=1&other=2");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn body_must_be_a_json_object() {
        assert!(decode_json_body(&Bytes::from_static(b"{\"x\":5}")).is_ok());
        assert!(decode_json_body(&Bytes::from_static(b"")).unwrap().is_empty());
        assert!(decode_json_body(&Bytes::from_static(b"not json")).is_err());
        assert!(decode_json_body(&Bytes::from_static(b"[1,2]")).is_err());
    }
}
