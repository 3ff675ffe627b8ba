use std::sync::Arc;

use atelier_types::{auth::SessionToken, error::ApiError, request::Request, response::Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::debug;

use crate::{repos::user::UserRepo, Config};

/// Verifies the bearer token against the session secret and attaches the
/// resulting [`Identity`](atelier_types::auth::Identity) to the request.
/// Requests without a valid token stay unauthenticated; the public
/// dispatch surface must keep working for them, and the per-route policy
/// rejects them where it matters.
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    users: UserRepo,
    config: Arc<Config>,
}

impl<S> AuthService<S> {
    pub fn new(inner: S, users: UserRepo, config: Arc<Config>) -> Self {
        Self {
            inner,
            users,
            config,
        }
    }
}

impl<S> Service<Request> for AuthService<S>
where
    S: Service<Request, Response = Response, Error = ApiError> + Send + Clone + 'static,
    S::Future: Send,
{
    type Response = Response;

    type Error = ApiError;

    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let mut this = self.clone();
        Box::pin(async move {
            if let Some(token) = req.token.as_deref() {
                match SessionToken::verify(token, &this.config.session_secret) {
                    Ok(identity) => {
                        // Account details live with the external auth
                        // system; the core only needs the row to exist.
                        this.users.ensure(&identity.user_id).await?;
                        req.extensions.insert(identity);
                    }
                    Err(_) => {
                        debug!("request carried a token that failed verification");
                    }
                }
            }

            this.inner.call(req).await
        })
    }
}

pub struct AuthServiceLayer {
    users: UserRepo,
    config: Arc<Config>,
}

impl AuthServiceLayer {
    pub fn new(users: UserRepo, config: Arc<Config>) -> Self {
        Self { users, config }
    }
}

impl<S> Layer<S> for AuthServiceLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService::new(inner, self.users.clone(), Arc::clone(&self.config))
    }
}
