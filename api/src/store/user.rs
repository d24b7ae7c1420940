use chrono::Utc;
use sqlx::SqlitePool;

use crate::{error::AppError, models::user::User};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";

pub struct UserStore;

impl UserStore {
    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn exists_by_email(pool: &SqlitePool, email: &str) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(pool)
            .await?;
        Ok(count > 0)
    }

    /// Insert a new user. A concurrent signup that wins the race on the
    /// unique email index surfaces as `EmailAlreadyExists`.
    pub async fn save(
        pool: &SqlitePool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, created_at) VALUES (?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation());
            if duplicate {
                AppError::EmailAlreadyExists
            } else {
                AppError::Sqlx(e)
            }
        })
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn save_then_find() {
        let pool = db::memory_pool().await.unwrap();
        let saved = UserStore::save(&pool, "Ann", "ann@x.com", "hash").await.unwrap();

        let by_email = UserStore::find_by_email(&pool, "ann@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, saved.id);
        assert_eq!(by_email.name, "Ann");

        assert!(UserStore::exists_by_email(&pool, "ann@x.com").await.unwrap());
        assert!(!UserStore::exists_by_email(&pool, "bob@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_conflict() {
        let pool = db::memory_pool().await.unwrap();
        UserStore::save(&pool, "Ann", "ann@x.com", "hash").await.unwrap();

        let err = UserStore::save(&pool, "Other Ann", "ann@x.com", "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailAlreadyExists));
        assert_eq!(UserStore::count(&pool).await.unwrap(), 1);
    }
}
