use atelier_framework::extract::{Json, Path, State};
use atelier_types::{
    auth::Identity,
    entity::Project,
    methods::{
        project::{CreateProjectParams, UpdateProjectParams},
        MessageResponse,
    },
    response::Response,
};

use crate::{
    context::Context,
    error::{Error, ErrorType},
    system::sync_registry,
};

/// Fetch a project and verify the caller owns it. Used by every handler
/// that writes under a project namespace.
pub(crate) async fn fetch_owned_project(
    ctx: &Context,
    identity: &Identity,
    id: &str,
) -> Result<Project, Error> {
    let project = ctx
        .repos
        .project
        .get(id)
        .await?
        .ok_or_else(|| ErrorType::NotFound(format!("Project `{id}` not found")))?;
    if project.user_id != identity.user_id {
        return Err(ErrorType::Forbidden("Project belongs to another user".into()).into());
    }
    Ok(project)
}

pub(crate) async fn handle_project_create(
    State(ctx): State<Context>,
    identity: Identity,
    Json(body): Json<CreateProjectParams>,
) -> Result<Response, Error> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(ErrorType::BadRequest("Project name is required".into()).into());
    }

    let project = Project::new(identity.user_id, name, body.description);
    ctx.repos.project.create(&project).await?;

    Response::created(project).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub(crate) async fn handle_project_list(
    State(ctx): State<Context>,
    identity: Identity,
) -> Result<Response, Error> {
    let projects = ctx.repos.project.list(&identity.user_id).await?;
    Response::raw(projects).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub(crate) async fn handle_project_get(
    State(ctx): State<Context>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let project = fetch_owned_project(&ctx, &identity, &id).await?;
    Response::raw(project).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub(crate) async fn handle_project_update(
    State(ctx): State<Context>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<UpdateProjectParams>,
) -> Result<Response, Error> {
    if body.name.is_none() && body.description.is_none() {
        return Err(ErrorType::BadRequest("No fields to update".into()).into());
    }
    if let Some(name) = &body.name {
        if name.trim().is_empty() {
            return Err(ErrorType::BadRequest("Project name must not be empty".into()).into());
        }
    }

    fetch_owned_project(&ctx, &identity, &id).await?;
    // Existing endpoint and page paths keep the slug they were created
    // under; only new ones pick up a renamed project.
    let updated = ctx
        .repos
        .project
        .update(
            &id,
            &identity.user_id,
            body.name.as_deref().map(str::trim),
            body.description.as_deref(),
        )
        .await?;
    if !updated {
        return Err(ErrorType::NotFound(format!("Project `{id}` not found")).into());
    }

    Response::raw(MessageResponse {
        message: "Project updated".into(),
    })
    .map_err(|err| ErrorType::BadResponseData(err).into())
}

pub(crate) async fn handle_project_delete(
    State(ctx): State<Context>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let project = fetch_owned_project(&ctx, &identity, &id).await?;

    let mut dropped_paths = vec![];
    if ctx.config.cascade_delete {
        dropped_paths.extend(ctx.repos.endpoint.delete_by_project(&project.id).await?);
        dropped_paths.extend(ctx.repos.page.delete_by_project(&project.id).await?);
    }
    let deleted = ctx.repos.project.delete(&id, &identity.user_id).await?;
    if !deleted {
        return Err(ErrorType::NotFound(format!("Project `{id}` not found")).into());
    }

    sync_registry(&ctx, |ctx| async move {
        for path in &dropped_paths {
            ctx.registry.unregister(path).await;
        }
        Ok(())
    })
    .await;

    Response::raw(MessageResponse {
        message: "Project deleted".into(),
    })
    .map_err(|err| ErrorType::BadResponseData(err).into())
}
