use chrono::Utc;

use crate::{
    authz,
    error::AppError,
    models::{
        post::{Page, Pageable, PostDto, PostRequest},
        user::Identity,
    },
    store::PostStore,
    AppState,
};

pub async fn list(state: &AppState, pageable: &Pageable) -> Result<Page<PostDto>, AppError> {
    let total = PostStore::count(&state.db).await?;
    let posts = PostStore::page(&state.db, pageable).await?;
    Ok(Page::new(posts, pageable, total).map(PostDto::from))
}

pub async fn get(state: &AppState, id: i64) -> Result<PostDto, AppError> {
    PostStore::find_by_id(&state.db, id)
        .await?
        .map(PostDto::from)
        .ok_or_else(|| AppError::post_not_found(id))
}

pub async fn create(
    state: &AppState,
    req: &PostRequest,
    caller: &Identity,
) -> Result<PostDto, AppError> {
    let post = PostStore::save(&state.db, &req.title, &req.content, caller.id, Utc::now()).await?;
    tracing::info!(post_id = post.id, author = %caller.email, "post created");
    Ok(post.into())
}

pub async fn update(
    state: &AppState,
    id: i64,
    req: &PostRequest,
    caller: &Identity,
) -> Result<PostDto, AppError> {
    ensure_author(state, id, caller, "update").await?;

    let post = PostStore::update(&state.db, id, &req.title, &req.content, Utc::now())
        .await?
        .ok_or_else(|| AppError::post_not_found(id))?;
    tracing::info!(post_id = id, author = %caller.email, "post updated");
    Ok(post.into())
}

pub async fn delete(state: &AppState, id: i64, caller: &Identity) -> Result<(), AppError> {
    ensure_author(state, id, caller, "delete").await?;

    if !PostStore::delete(&state.db, id).await? {
        return Err(AppError::post_not_found(id));
    }
    tracing::info!(post_id = id, author = %caller.email, "post deleted");
    Ok(())
}

/// 404 for a missing post, then 403 unless `caller` wrote it. The post is
/// read twice on purpose: existence here, authorship through `authz`.
async fn ensure_author(
    state: &AppState,
    id: i64,
    caller: &Identity,
    action: &str,
) -> Result<(), AppError> {
    if PostStore::find_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::post_not_found(id));
    }
    if !authz::is_author(&state.db, id, &caller.email).await? {
        tracing::warn!(post_id = id, caller = %caller.email, "refused {} by non-author", action);
        return Err(AppError::Forbidden(format!(
            "You are not authorized to {action} this post"
        )));
    }
    Ok(())
}
