use sqlx::PgPool;

use crate::db::models::Notification;

const COLUMNS: &str = "id, user_id, title, message, is_read, created_at";

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS} FROM notifications
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2",
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn mark_all_read(pool: &PgPool, user_id: &str) -> Result<u64, sqlx::Error> {
    let done =
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
            .bind(user_id)
            .execute(pool)
            .await?;
    Ok(done.rows_affected())
}

pub(crate) async fn delete_one_for_user(
    pool: &PgPool,
    id: &str,
    user_id: &str,
) -> Result<u64, sqlx::Error> {
    let done = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(done.rows_affected())
}

pub(crate) async fn delete_all_for_user(pool: &PgPool, user_id: &str) -> Result<u64, sqlx::Error> {
    let done = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(done.rows_affected())
}
