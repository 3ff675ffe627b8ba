use atelier_framework::extract::State;
use atelier_types::{methods::debug::RoutesResponse, response::Response};

use crate::{
    context::Context,
    error::{Error, ErrorType},
};

// Admin-only; the route is registered with `RouteConfig::admin()`.
pub(crate) async fn handle_debug_routes(
    State(ctx): State<Context>,
) -> Result<Response, Error> {
    ctx.registry.ensure_initialized().await?;
    let routes = ctx.registry.route_summaries().await;
    let count = routes.len();
    Response::raw(RoutesResponse { routes, count })
        .map_err(|err| ErrorType::BadResponseData(err).into())
}
