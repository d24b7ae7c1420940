use sqlx::SqlitePool;

use crate::{error::AppError, store::PostStore};

/// Whether `caller_email` wrote post `post_id`. A missing post is simply not
/// authored by anyone; callers report existence separately.
pub async fn is_author(pool: &SqlitePool, post_id: i64, caller_email: &str) -> Result<bool, AppError> {
    Ok(PostStore::find_by_id(pool, post_id)
        .await?
        .is_some_and(|post| post.author_email == caller_email))
}
