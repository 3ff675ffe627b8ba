use std::{future::Future, marker::PhantomData, pin::Pin};

use atelier_types::{error::ApiError, request::Request, response::Response};
use tower::{util::BoxCloneService, Layer, Service, ServiceExt};

use super::method_router::{MethodRouter, Route};

pub struct Building;
pub struct Ready;

/// Wrapper around `matchit::Router` with an optional fallback service.
///
/// Static routes are matched first; any request that matches none of them
/// is handed to the fallback. The dynamic dispatcher registers itself as
/// the fallback so user-defined routes never shadow the reserved surface.
pub struct Router<Stage = Building> {
    routes: Vec<(&'static str, MethodRouter)>,
    fallback: Option<BoxCloneService<Request, Response, ApiError>>,
    router: matchit::Router<MethodRouter>,
    _marker: PhantomData<Stage>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::default(),
            fallback: None,
            router: matchit::Router::default(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn route(mut self, path: &'static str, route: MethodRouter) -> Self {
        self.routes.push((path, route));
        self
    }

    /// Install the service that handles every request no static route
    /// matched.
    #[must_use]
    pub fn fallback<S>(mut self, svc: S) -> Self
    where
        S: Service<Request, Response = Response, Error = ApiError> + Clone + Send + 'static,
        S::Future: Send + 'static,
    {
        self.fallback = Some(BoxCloneService::new(svc));
        self
    }

    /// Apply a layer to every static route. The fallback is left alone;
    /// it receives its dependencies at construction time.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route>,
        L::Service:
            Service<Request, Error = ApiError, Response = Response> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.routes = self
            .routes
            .into_iter()
            .map(|(path, route)| (path, route.layer(&layer)))
            .collect();
        self
    }

    pub fn build(mut self) -> Router<Ready> {
        for (path, route) in self.routes.clone() {
            self.router
                .insert(path, route)
                .expect("No path should overlap");
        }
        Router::<Ready> {
            routes: self.routes,
            fallback: self.fallback,
            router: self.router,
            _marker: PhantomData,
        }
    }
}

impl Clone for Router<Ready> {
    fn clone(&self) -> Self {
        Self {
            routes: self.routes.clone(),
            fallback: self.fallback.clone(),
            router: self.router.clone(),
            _marker: PhantomData,
        }
    }
}

impl Service<Request> for Router<Ready> {
    type Response = Response;

    type Error = ApiError;

    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let prefixed_path = if req.path.starts_with('/') {
            req.path.clone()
        } else {
            format!("/{}", req.path)
        };
        let matched = match self.router.at(&prefixed_path) {
            Ok(matched) => matched,
            Err(_) => {
                let fallback = self.fallback.clone();
                return Box::pin(async move {
                    match fallback {
                        Some(fallback) => fallback.oneshot(req).await,
                        None => Err(ApiError::not_found()),
                    }
                });
            }
        };
        req.params = matched
            .params
            .iter()
            .map(|(_key, val)| val.to_string())
            .collect();
        let matched = matched.value.clone();
        Box::pin(async move { matched.oneshot(req).await })
    }
}

#[cfg(test)]
mod tests {
    use atelier_types::{
        error::{ApiError, StatusCode},
        request::{Operation, Request},
        response::Response,
    };
    use tower::{service_fn, ServiceExt};

    use crate::{get_with_config, RouteConfig};

    use super::Router;

    async fn static_handler() -> Result<Response, ApiError> {
        Response::raw("static").map_err(|_| ApiError::internal_error())
    }

    fn router() -> Router<super::Ready> {
        Router::new()
            .route(
                "/api/things",
                get_with_config(static_handler, RouteConfig::unauthenticated()),
            )
            .fallback(service_fn(|_req: Request| async {
                Response::raw("fallback").map_err(|_| ApiError::internal_error())
            }))
            .build()
    }

    #[tokio::test]
    async fn static_routes_win_over_the_fallback() {
        let resp = router()
            .oneshot(Request::internal().with_operation(Operation::Get).with_path(&"/api/things"))
            .await
            .unwrap();
        match resp {
            Response::Json { body, .. } => assert_eq!(body, "static"),
            Response::Html { .. } => panic!("expected a json response"),
        }
    }

    #[tokio::test]
    async fn unmatched_paths_reach_the_fallback() {
        let resp = router()
            .oneshot(Request::internal().with_operation(Operation::Get).with_path(&"/anything/else"))
            .await
            .unwrap();
        match resp {
            Response::Json { body, .. } => assert_eq!(body, "fallback"),
            Response::Html { .. } => panic!("expected a json response"),
        }
    }

    #[tokio::test]
    async fn no_fallback_means_not_found() {
        let router = Router::new()
            .route(
                "/api/things",
                get_with_config(static_handler, RouteConfig::unauthenticated()),
            )
            .build();
        let err = router
            .oneshot(Request::internal().with_operation(Operation::Get).with_path(&"/nope"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code, StatusCode::NOT_FOUND);
    }
}
