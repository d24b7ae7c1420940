use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("password hash error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),

    #[error("token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email is already in use!")]
    EmailAlreadyExists,

    #[error("{resource} not found with {field} : {value}")]
    NotFound {
        resource: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Validation(String),
}

impl AppError {
    pub fn post_not_found(id: i64) -> Self {
        AppError::NotFound {
            resource: "Post",
            field: "id",
            value: id.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Sqlx(_) | AppError::PasswordHash(_) | AppError::Jwt(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidCredentials | AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AppError::Sqlx(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::PasswordHash(e) => {
                tracing::error!("Password hashing error: {}", e);
                "Password hashing error".to_string()
            }
            AppError::Jwt(e) => {
                tracing::error!("JWT error: {}", e);
                "Token error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
