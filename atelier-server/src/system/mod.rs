mod debug;
mod endpoint;
mod page;
mod project;

use atelier_framework::{
    extract::State, get, get_with_config, post, Ready, RouteConfig, Router,
};
use tracing::warn;

use crate::{context::Context, dispatch::DispatchService, error::Error};

use self::{
    debug::handle_debug_routes,
    endpoint::{
        handle_endpoint_create, handle_endpoint_delete, handle_endpoint_get, handle_endpoint_list,
        handle_endpoint_update,
    },
    page::{
        handle_page_create, handle_page_delete, handle_page_get, handle_page_list,
        handle_page_update,
    },
    project::{
        handle_project_create, handle_project_delete, handle_project_get, handle_project_list,
        handle_project_update,
    },
};

/// The reserved CRUD surface plus the catch-all dispatcher as fallback.
pub fn new_api_router(ctx: Context, dispatcher: DispatchService) -> Router<Ready> {
    Router::new()
        .route(
            "/api/projects",
            post(handle_project_create).get(handle_project_list),
        )
        .route(
            "/api/projects/:id",
            get(handle_project_get)
                .put(handle_project_update)
                .delete(handle_project_delete),
        )
        .route(
            "/api/endpoints",
            post(handle_endpoint_create).get(handle_endpoint_list),
        )
        .route(
            "/api/endpoints/:id",
            get(handle_endpoint_get)
                .put(handle_endpoint_update)
                .delete(handle_endpoint_delete),
        )
        .route("/api/pages", post(handle_page_create).get(handle_page_list))
        .route(
            "/api/pages/:id",
            get(handle_page_get)
                .put(handle_page_update)
                .delete(handle_page_delete),
        )
        .route(
            "/api/debug/routes",
            get_with_config(handle_debug_routes, RouteConfig::admin()),
        )
        .fallback(dispatcher)
        .layer(State(ctx))
        .build()
}

/// Bring the registry in line after a successful store write. A failure
/// here must not fail the CRUD operation: the store is the source of
/// truth and the registry reconciles on the next refresh or restart.
pub(crate) async fn sync_registry<F, Fut>(ctx: &Context, op: F)
where
    F: FnOnce(Context) -> Fut,
    Fut: std::future::Future<Output = Result<(), Error>>,
{
    if let Err(error) = async {
        ctx.registry.ensure_initialized().await?;
        op(ctx.clone()).await
    }
    .await
    {
        warn!(%error, "store write succeeded but registry sync failed; will reconcile later");
    }
}
