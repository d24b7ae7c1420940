use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::request::Parts,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::{service, CurrentUser},
    error::AppError,
    models::{
        post::{Page, PageQuery, Pageable, PostDto, PostRequest},
        user::{JwtResponse, LoginRequest, SignupRequest},
    },
    posts, AppState,
};

/// `Json` whose rejections (bad syntax, missing fields, wrong content type)
/// come back as 400 in the usual `{"error": ...}` shape.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(AppJson(value))
    }
}

/// `Query` with rejections mapped like [`AppJson`].
pub struct AppQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(AppQuery(value))
    }
}

/// `Path` with rejections mapped like [`AppJson`].
pub struct AppPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(AppPath(value))
    }
}

// Auth

#[tracing::instrument(skip_all, fields(email = %req.email))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> Result<&'static str, AppError> {
    req.validate()?;
    let identity = service::register(&state, &req).await?;
    tracing::info!(user_id = identity.id, "user registered");
    Ok("User registered successfully!")
}

#[tracing::instrument(skip_all, fields(email = %req.email))]
pub async fn signin(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<JwtResponse>, AppError> {
    req.validate()?;
    match service::authenticate(&state, &req).await {
        Ok(response) => {
            tracing::info!(user_id = response.id, "user signed in");
            Ok(Json(response))
        }
        Err(AppError::InvalidCredentials) => {
            tracing::warn!("rejected sign-in");
            Err(AppError::InvalidCredentials)
        }
        Err(e) => Err(e),
    }
}

// Posts

#[tracing::instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Page<PostDto>>, AppError> {
    let pageable = Pageable::try_from(query)?;
    Ok(Json(posts::list(&state, &pageable).await?))
}

#[tracing::instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<PostDto>, AppError> {
    Ok(Json(posts::get(&state, id).await?))
}

#[tracing::instrument(skip_all, fields(caller = %caller.email))]
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    AppJson(req): AppJson<PostRequest>,
) -> Result<Json<PostDto>, AppError> {
    req.validate()?;
    Ok(Json(posts::create(&state, &req, &caller).await?))
}

#[tracing::instrument(skip(state, caller, req), fields(caller = %caller.email))]
pub async fn update_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    CurrentUser(caller): CurrentUser,
    AppJson(req): AppJson<PostRequest>,
) -> Result<Json<PostDto>, AppError> {
    req.validate()?;
    Ok(Json(posts::update(&state, id, &req, &caller).await?))
}

#[tracing::instrument(skip(state, caller), fields(caller = %caller.email))]
pub async fn delete_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    CurrentUser(caller): CurrentUser,
) -> Result<&'static str, AppError> {
    posts::delete(&state, id, &caller).await?;
    Ok("Post deleted successfully")
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/signin", post(signin))
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
