use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{auth::service::current_identity, error::AppError, models::user::Identity, AppState};

/// Extractor for routes that require a signed-in caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let identity = current_identity(state, token).await?;
        Ok(CurrentUser(identity))
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("Missing authorization header".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthenticated("Invalid authorization header format".into()))?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthenticated("Invalid authorization header format".into()))?;

    Ok(token)
}
