use crate::{
    auth::credentials::{hash_password, verify_password},
    error::AppError,
    models::user::{Claims, Identity, JwtResponse, LoginRequest, SignupRequest},
    store::UserStore,
    AppState,
};

/// Check email and password and issue a token for the matching user.
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn authenticate(state: &AppState, req: &LoginRequest) -> Result<JwtResponse, AppError> {
    let user = UserStore::find_by_email(&state.db, &req.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let identity = Identity::from_user(&user);
    let token = state.tokens.issue(&identity.email, &identity.roles)?;
    Ok(JwtResponse::new(token, identity))
}

pub async fn register(state: &AppState, req: &SignupRequest) -> Result<Identity, AppError> {
    if UserStore::exists_by_email(&state.db, &req.email).await? {
        return Err(AppError::EmailAlreadyExists);
    }

    let password_hash = hash_password(&req.password)?;
    let user = UserStore::save(&state.db, req.name.trim(), &req.email, &password_hash).await?;
    Ok(Identity::from_user(&user))
}

/// Resolve the caller behind a bearer token. The token's subject is looked up
/// again so a token for a user that no longer exists stops working.
pub async fn current_identity(state: &AppState, token: &str) -> Result<Identity, AppError> {
    let Claims { sub, .. } = state.tokens.verify(token)?;
    let user = UserStore::find_by_email(&state.db, &sub)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Unknown user".into()))?;
    Ok(Identity::from_user(&user))
}
