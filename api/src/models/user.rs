use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const ROLE_USER: &str = "ROLE_USER";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name must not be blank".into()));
        }
        if name.chars().count() > 50 {
            return Err(AppError::Validation(
                "name must be at most 50 characters".into(),
            ));
        }
        validate_email(&self.email)?;
        let len = self.password.chars().count();
        if !(6..=40).contains(&len) {
            return Err(AppError::Validation(
                "password must be between 6 and 40 characters".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_email(&self.email)?;
        if self.password.trim().is_empty() {
            return Err(AppError::Validation("password must not be blank".into()));
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::Validation("email must be a well-formed email address".into());

    if email.trim().is_empty() {
        return Err(AppError::Validation("email must not be blank".into()));
    }
    if email.chars().count() > 100 || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels_ok = domain.contains('.') && domain.split('.').all(|label| !label.is_empty());
    if !labels_ok {
        return Err(invalid());
    }
    Ok(())
}

/// Signed token payload. `sub` carries the user's email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub roles: Vec<String>,
    pub iat: usize,
    pub exp: usize,
}

/// The authenticated caller, resolved once per request and passed explicitly
/// into the operations that need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn from_user(user: &User) -> Self {
        Identity {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            roles: vec![ROLE_USER.to_string()],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JwtResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl JwtResponse {
    pub fn new(token: String, identity: Identity) -> Self {
        JwtResponse {
            token,
            token_type: "Bearer",
            id: identity.id,
            username: identity.email.clone(),
            name: identity.name,
            email: identity.email,
            roles: identity.roles,
        }
    }
}
