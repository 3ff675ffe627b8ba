use atelier_framework::extract::{Json, Path, Query, State};
use atelier_types::{
    auth::Identity,
    entity::Endpoint,
    methods::{
        endpoint::{CreateEndpointParams, UpdateEndpointParams},
        ListQuery, MessageResponse,
    },
    response::Response,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    context::Context,
    error::{Error, ErrorType},
    path::compose_endpoint_path,
    repos::endpoint::EndpointUpdate,
    system::{project::fetch_owned_project, sync_registry},
};

pub(crate) async fn handle_endpoint_create(
    State(ctx): State<Context>,
    identity: Identity,
    Json(body): Json<CreateEndpointParams>,
) -> Result<Response, Error> {
    let project = fetch_owned_project(&ctx, &identity, &body.project_id).await?;
    let full_path = compose_endpoint_path(&project.name_slug, &body.path)?;

    let endpoint = Endpoint {
        id: Uuid::new_v4().to_string(),
        path: full_path.clone(),
        parameters: body.parameters.unwrap_or_default(),
        code: body.code,
        language: body.language.unwrap_or_default(),
        http_method: body.http_method.unwrap_or_default(),
        project_id: project.id.clone(),
        user_id: identity.user_id.clone(),
        created_at: Utc::now(),
        user_email: None,
        project_name: Some(project.name.clone()),
    };
    match ctx.repos.endpoint.create(&endpoint).await {
        Err(err) if err.is_unique_violation() => {
            return Err(ErrorType::PathConflict { path: full_path }.into());
        }
        other => other?,
    }

    // A compile failure still registers: the stub handler reports the
    // stored error to whoever calls the endpoint.
    sync_registry(&ctx, |ctx| {
        let endpoint = endpoint.clone();
        async move {
            ctx.registry.register_endpoint(&endpoint).await;
            Ok(())
        }
    })
    .await;

    Response::created(endpoint).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub(crate) async fn handle_endpoint_list(
    State(ctx): State<Context>,
    identity: Identity,
    Query(query): Query<ListQuery>,
) -> Result<Response, Error> {
    let endpoints = match query.project_id.as_deref() {
        Some(project_id) => {
            let project = fetch_owned_project(&ctx, &identity, project_id).await?;
            ctx.repos.endpoint.list_by_project(&project.id).await?
        }
        None => ctx.repos.endpoint.list_by_owner(&identity.user_id).await?,
    };
    Response::raw(endpoints).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub(crate) async fn handle_endpoint_get(
    State(ctx): State<Context>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let endpoint = fetch_owned_endpoint(&ctx, &identity, &id).await?;
    Response::raw(endpoint).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub(crate) async fn handle_endpoint_update(
    State(ctx): State<Context>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<UpdateEndpointParams>,
) -> Result<Response, Error> {
    if body.is_empty() {
        return Err(ErrorType::BadRequest("No fields to update".into()).into());
    }

    let existing = fetch_owned_endpoint(&ctx, &identity, &id).await?;

    // A new path is re-anchored under the slug of the (possibly new)
    // project; moving projects without renaming keeps the old path.
    let new_path = if let Some(raw) = &body.path {
        let project_id = body.project_id.as_deref().unwrap_or(&existing.project_id);
        let project = fetch_owned_project(&ctx, &identity, project_id).await?;
        Some(compose_endpoint_path(&project.name_slug, raw)?)
    } else {
        if let Some(project_id) = &body.project_id {
            fetch_owned_project(&ctx, &identity, project_id).await?;
        }
        None
    };

    let update = EndpointUpdate {
        path: new_path.clone(),
        parameters: body.parameters,
        code: body.code,
        language: body.language,
        http_method: body.http_method,
        project_id: body.project_id,
    };
    match ctx.repos.endpoint.update(&id, &identity.user_id, &update).await {
        Ok(true) => {}
        Ok(false) => {
            return Err(ErrorType::NotFound(format!("Endpoint `{id}` not found")).into());
        }
        Err(err) if err.is_unique_violation() => {
            return Err(ErrorType::PathConflict {
                path: new_path.unwrap_or(existing.path),
            }
            .into());
        }
        Err(err) => return Err(err),
    }

    sync_registry(&ctx, |ctx| {
        let old_path = existing.path.clone();
        async move {
            if let Some(updated) = ctx.repos.endpoint.get(&id).await? {
                if updated.path != old_path {
                    ctx.registry.unregister(&old_path).await;
                }
                ctx.registry.register_endpoint(&updated).await;
            }
            Ok(())
        }
    })
    .await;

    Response::raw(MessageResponse {
        message: "Endpoint updated".into(),
    })
    .map_err(|err| ErrorType::BadResponseData(err).into())
}

pub(crate) async fn handle_endpoint_delete(
    State(ctx): State<Context>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let existing = fetch_owned_endpoint(&ctx, &identity, &id).await?;
    let deleted = ctx.repos.endpoint.delete(&id, &identity.user_id).await?;
    if !deleted {
        return Err(ErrorType::NotFound(format!("Endpoint `{id}` not found")).into());
    }

    sync_registry(&ctx, |ctx| {
        let path = existing.path.clone();
        async move {
            ctx.registry.unregister(&path).await;
            Ok(())
        }
    })
    .await;

    Response::raw(MessageResponse {
        message: "Endpoint deleted".into(),
    })
    .map_err(|err| ErrorType::BadResponseData(err).into())
}

async fn fetch_owned_endpoint(
    ctx: &Context,
    identity: &Identity,
    id: &str,
) -> Result<Endpoint, Error> {
    let endpoint = ctx
        .repos
        .endpoint
        .get(id)
        .await?
        .ok_or_else(|| ErrorType::NotFound(format!("Endpoint `{id}` not found")))?;
    if endpoint.user_id != identity.user_id {
        return Err(ErrorType::Forbidden("Endpoint belongs to another user".into()).into());
    }
    Ok(endpoint)
}
