use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;

/// Inserts one notification per student who has notifications enabled.
/// Returns how many were written.
pub(crate) async fn broadcast_to_students(
    pool: &PgPool,
    title: &str,
    message: &str,
) -> Result<u64, sqlx::Error> {
    let recipient_ids: Vec<String> = sqlx::query_scalar(
        "SELECT id FROM users WHERE role = $1 AND notifications_enabled AND is_active",
    )
    .bind(UserRole::Student)
    .fetch_all(pool)
    .await?;

    if recipient_ids.is_empty() {
        return Ok(0);
    }

    let now = primitive_now_utc();
    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO notifications (id, user_id, title, message, is_read, created_at) ",
    );
    builder.push_values(recipient_ids.iter(), |mut row, user_id| {
        row.push_bind(Uuid::new_v4().to_string())
            .push_bind(user_id)
            .push_bind(title)
            .push_bind(message)
            .push_bind(false)
            .push_bind(now);
    });

    let written = builder.build().execute(pool).await?.rows_affected();
    Ok(written)
}

/// Fire-and-forget wrapper: a fan-out failure is logged, never surfaced to
/// the request that triggered it.
pub(crate) async fn broadcast_best_effort(pool: &PgPool, title: &str, message: &str) {
    match broadcast_to_students(pool, title, message).await {
        Ok(count) => {
            tracing::debug!(recipients = count, title, "Notification fan-out complete");
        }
        Err(err) => {
            tracing::warn!(error = %err, title, "Notification fan-out failed");
        }
    }
}
