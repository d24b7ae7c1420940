pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod posts;
pub mod rest;
pub mod store;

use axum::Router;
use sqlx::sqlite::SqlitePool;

use crate::{auth::TokenKeys, config::Config};

pub use crate::config::ConfigError;
pub use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &Config) -> Self {
        AppState {
            db,
            tokens: TokenKeys::new(&config.jwt_secret, config.jwt_expiration_secs),
        }
    }
}

pub fn app(state: AppState) -> Router {
    rest::router(state)
}

#[cfg(test)]
pub(crate) async fn test_state() -> AppState {
    let pool = db::memory_pool().await.expect("in-memory database");
    AppState {
        db: pool,
        tokens: TokenKeys::new("test-secret", 3600),
    }
}
