use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::post::{Pageable, Post},
};

const POST_SELECT: &str = "SELECT p.id, p.title, p.content, p.author_id, u.email AS author_email, \
     p.created_at, p.updated_at FROM posts p JOIN users u ON u.id = p.author_id";

pub struct PostStore;

impl PostStore {
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!("{POST_SELECT} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(post)
    }

    /// Insert a post; `created_at` and `updated_at` both start at `now`.
    pub async fn save(
        pool: &SqlitePool,
        title: &str,
        content: &str,
        author_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Post, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO posts (title, content, author_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(title)
        .bind(content)
        .bind(author_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::post_not_found(id))
    }

    /// Overwrite title and content. Returns `None` if the row is gone.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Post>, AppError> {
        let result = sqlx::query("UPDATE posts SET title = ?, content = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(content)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// One page of posts, ordered by the requested column with `id` as the
    /// tie-breaker so consecutive pages never overlap.
    pub async fn page(pool: &SqlitePool, pageable: &Pageable) -> Result<Vec<Post>, AppError> {
        let sql = format!(
            "{POST_SELECT} ORDER BY {} {}, p.id ASC LIMIT ? OFFSET ?",
            pageable.sort.column(),
            pageable.direction.keyword(),
        );
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(pageable.size)
            .bind(pageable.offset())
            .fetch_all(pool)
            .await?;
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, store::UserStore};

    #[tokio::test]
    async fn crud_round_trip() {
        let pool = db::memory_pool().await.unwrap();
        let ann = UserStore::save(&pool, "Ann", "ann@x.com", "hash").await.unwrap();

        let now = Utc::now();
        let post = PostStore::save(&pool, "Hi", "World", ann.id, now).await.unwrap();
        assert_eq!(post.author_email, "ann@x.com");
        assert_eq!(post.created_at, post.updated_at);

        let later = now + chrono::Duration::seconds(5);
        let updated = PostStore::update(&pool, post.id, "Hi again", "Moon", later)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Hi again");
        assert_eq!(updated.created_at, post.created_at);
        assert!(updated.updated_at > updated.created_at);

        assert!(PostStore::delete(&pool, post.id).await.unwrap());
        assert!(!PostStore::delete(&pool, post.id).await.unwrap());
        assert!(PostStore::find_by_id(&pool, post.id).await.unwrap().is_none());
        assert!(PostStore::update(&pool, post.id, "x", "y", later)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn page_orders_by_id_by_default() {
        let pool = db::memory_pool().await.unwrap();
        let ann = UserStore::save(&pool, "Ann", "ann@x.com", "hash").await.unwrap();
        for i in 0..5 {
            PostStore::save(&pool, &format!("post {i}"), "body", ann.id, Utc::now())
                .await
                .unwrap();
        }

        let pageable = Pageable {
            page: 1,
            size: 2,
            ..Pageable::default()
        };
        let posts = PostStore::page(&pool, &pageable).await.unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["post 2", "post 3"]);
        assert_eq!(PostStore::count(&pool).await.unwrap(), 5);
    }
}
