use atelier_framework::extract::{Json, Path, Query, State};
use atelier_types::{
    auth::Identity,
    entity::Page,
    methods::{
        page::{CreatePageParams, UpdatePageParams},
        ListQuery, MessageResponse,
    },
    response::Response,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    context::Context,
    error::{Error, ErrorType},
    path::compose_page_path,
    repos::page::PageUpdate,
    system::{project::fetch_owned_project, sync_registry},
};

pub(crate) async fn handle_page_create(
    State(ctx): State<Context>,
    identity: Identity,
    Json(body): Json<CreatePageParams>,
) -> Result<Response, Error> {
    let project = fetch_owned_project(&ctx, &identity, &body.project_id).await?;
    let full_path = compose_page_path(&project.name_slug, &body.path)?;

    let page = Page {
        id: Uuid::new_v4().to_string(),
        path: full_path.clone(),
        html_content: body.html_content,
        project_id: project.id.clone(),
        user_id: identity.user_id.clone(),
        created_at: Utc::now(),
        user_email: None,
        project_name: Some(project.name.clone()),
    };
    match ctx.repos.page.create(&page).await {
        Err(err) if err.is_unique_violation() => {
            return Err(ErrorType::PathConflict { path: full_path }.into());
        }
        other => other?,
    }

    sync_registry(&ctx, |ctx| {
        let page = page.clone();
        async move {
            ctx.registry.register_page(&page).await;
            Ok(())
        }
    })
    .await;

    Response::created(page).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub(crate) async fn handle_page_list(
    State(ctx): State<Context>,
    identity: Identity,
    Query(query): Query<ListQuery>,
) -> Result<Response, Error> {
    let pages = match query.project_id.as_deref() {
        Some(project_id) => {
            let project = fetch_owned_project(&ctx, &identity, project_id).await?;
            ctx.repos.page.list_by_project(&project.id).await?
        }
        None => ctx.repos.page.list_by_owner(&identity.user_id).await?,
    };
    Response::raw(pages).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub(crate) async fn handle_page_get(
    State(ctx): State<Context>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let page = fetch_owned_page(&ctx, &identity, &id).await?;
    Response::raw(page).map_err(|err| ErrorType::BadResponseData(err).into())
}

pub(crate) async fn handle_page_update(
    State(ctx): State<Context>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<UpdatePageParams>,
) -> Result<Response, Error> {
    if body.is_empty() {
        return Err(ErrorType::BadRequest("No fields to update".into()).into());
    }

    let existing = fetch_owned_page(&ctx, &identity, &id).await?;

    let new_path = if let Some(raw) = &body.path {
        let project_id = body.project_id.as_deref().unwrap_or(&existing.project_id);
        let project = fetch_owned_project(&ctx, &identity, project_id).await?;
        Some(compose_page_path(&project.name_slug, raw)?)
    } else {
        if let Some(project_id) = &body.project_id {
            fetch_owned_project(&ctx, &identity, project_id).await?;
        }
        None
    };

    let update = PageUpdate {
        path: new_path.clone(),
        html_content: body.html_content,
        project_id: body.project_id,
    };
    match ctx.repos.page.update(&id, &identity.user_id, &update).await {
        Ok(true) => {}
        Ok(false) => {
            return Err(ErrorType::NotFound(format!("Page `{id}` not found")).into());
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
            if let Some(updated) = ctx.repos.page.get(&id).await? {
                if updated.path != old_path {
                    ctx.registry.unregister(&old_path).await;
                }
                ctx.registry.register_page(&updated).await;
            }
            Ok(())
        }
    })
    .await;

    Response::raw(MessageResponse {
        message: "Page updated".into(),
    })
    .map_err(|err| ErrorType::BadResponseData(err).into())
}

pub(crate) async fn handle_page_delete(
    State(ctx): State<Context>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let existing = fetch_owned_page(&ctx, &identity, &id).await?;
    let deleted = ctx.repos.page.delete(&id, &identity.user_id).await?;
    if !deleted {
        return Err(ErrorType::NotFound(format!("Page `{id}` not found")).into());
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
        message: "Page deleted".into(),
    })
    .map_err(|err| ErrorType::BadResponseData(err).into())
}

async fn fetch_owned_page(ctx: &Context, identity: &Identity, id: &str) -> Result<Page, Error> {
    let page = ctx
        .repos
        .page
        .get(id)
        .await?
        .ok_or_else(|| ErrorType::NotFound(format!("Page `{id}` not found")))?;
    if page.user_id != identity.user_id {
        return Err(ErrorType::Forbidden("Page belongs to another user".into()).into());
    }
    Ok(page)
}
