use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::LeaderboardTotal;

/// Folds one freshly scored submission into the user's running totals.
/// The first submission creates the row; later ones only ever add to it.
pub(crate) async fn apply_submission(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    score: f64,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO leaderboard_totals (user_id, total_score, exams_attempted, updated_at)
         VALUES ($1, $2, 1, $3)
         ON CONFLICT (user_id) DO UPDATE SET
            total_score = leaderboard_totals.total_score + EXCLUDED.total_score,
            exams_attempted = leaderboard_totals.exams_attempted + 1,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(user_id)
    .bind(score)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn find_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<LeaderboardTotal>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardTotal>(
        "SELECT user_id, total_score, exams_attempted, updated_at
         FROM leaderboard_totals WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
