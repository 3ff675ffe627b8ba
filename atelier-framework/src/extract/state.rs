use std::ops::Deref;

use atelier_types::{error::ApiError, request::Request};
use tower::Service;
use tracing::error;

use super::FromRequest;

/// Shared application state, made available to handlers as an extractor.
///
/// The server wraps its dependency bundle (store handles, the route
/// registry, config) in one cheaply clonable value and installs it with
/// `.layer(State(ctx))`; handlers then take `State(ctx)` as an argument.
/// `State` doubles as the [`tower::Layer`] that seeds each request with
/// that value.
#[derive(Debug, Clone)]
pub struct State<T>(pub T);

impl<T> Deref for State<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> tower::Layer<S> for State<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Service = ProvideState<S, T>;

    fn layer(&self, inner: S) -> Self::Service {
        ProvideState {
            inner,
            state: self.0.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProvideState<S, T> {
    inner: S,
    state: T,
}

impl<S, T> Service<Request> for ProvideState<S, T>
where
    S: Service<Request>,
    T: Clone + Send + Sync + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    #[inline]
    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        req.extensions.insert(self.state.clone());
        self.inner.call(req)
    }
}

impl<T> FromRequest for State<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from_request(req: &mut Request) -> Result<Self, ApiError> {
        match req.extensions.get::<T>() {
            Some(state) => Ok(State(state.clone())),
            None => {
                // A handler reached without its state layer is a wiring
                // bug, not a client error; leave a trace of which type
                // was missing.
                error!(
                    state = std::any::type_name::<T>(),
                    "handler ran without its state layer installed"
                );
                Err(ApiError::internal_error())
            }
        }
    }
}
