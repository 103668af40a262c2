use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use time::Duration;

use crate::api::errors::ApiError;
use crate::api::guards::OptionalUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::leaderboard::{LeaderboardQuery, Timeframe};
use crate::services::standings::{self, Standings};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(leaderboard))
}

/// The windowed leaderboard: the current window ranked and partitioned, the
/// previous window consulted only for rank movement. Both windows are
/// recomputed per request from the result history.
async fn leaderboard(
    Query(params): Query<LeaderboardQuery>,
    OptionalUser(viewer): OptionalUser,
    State(state): State<AppState>,
) -> Result<Json<Standings>, ApiError> {
    let now = primitive_now_utc();
    let week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);
    let subject = params.subject_filter();

    let (current, previous) = match params.timeframe() {
        Timeframe::Weekly => {
            let current =
                repositories::results::window_rows(state.db(), Some(week_ago), None, subject)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to rank current window"))?;
            let previous = repositories::results::window_rows(
                state.db(),
                Some(two_weeks_ago),
                Some(week_ago),
                subject,
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to rank previous window"))?;
            (current, previous)
        }
        Timeframe::AllTime => {
            let current = repositories::results::window_rows(state.db(), None, None, subject)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to rank current window"))?;
            let previous =
                repositories::results::window_rows(state.db(), None, Some(week_ago), subject)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to rank previous window"))?;
            (current, previous)
        }
    };

    let viewer_id = viewer.as_ref().map(|user| user.id.as_str());
    Ok(Json(standings::build_standings(current, &previous, viewer_id)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::core::time::primitive_now_utc;
    use crate::db::types::UserRole;
    use crate::repositories;
    use crate::test_support;

    async fn insert_result(
        pool: &sqlx::PgPool,
        user_id: &str,
        exam_id: &str,
        score: f64,
        days_ago: i64,
    ) {
        repositories::results::create(
            pool,
            repositories::results::CreateResult {
                id: &Uuid::new_v4().to_string(),
                user_id,
                exam_id,
                score,
                total_marks: 10,
                correct_answers: score as i32,
                wrong_answers: 0,
                skipped_answers: 10 - score as i32,
                accuracy: score * 10.0,
                answers: Vec::new(),
                submitted_at: primitive_now_utc() - Duration::days(days_ago),
            },
        )
        .await
        .expect("insert result");
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres"]
    async fn weekly_board_tracks_movement_and_drops_stale_users() {
        let ctx = test_support::setup_test_context().await;
        let db = ctx.state.db();

        let fresh = test_support::insert_user(db, "fresh@example.com", "Fresh", "pass-word1", UserRole::Student).await;
        let steady = test_support::insert_user(db, "steady@example.com", "Steady", "pass-word1", UserRole::Student).await;
        let stale = test_support::insert_user(db, "stale@example.com", "Stale", "pass-word1", UserRole::Student).await;

        let physics = test_support::insert_exam(db, "Physics Mock", "Physics", 10).await;
        let maths = test_support::insert_exam(db, "Maths Mock", "Maths", 10).await;

        // steady scored in both windows, fresh only in the current one,
        // stale only in the previous one
        insert_result(db, &steady.id, &physics.id, 5.0, 10).await;
        insert_result(db, &steady.id, &maths.id, 4.0, 1).await;
        insert_result(db, &fresh.id, &physics.id, 9.0, 2).await;
        insert_result(db, &stale.id, &maths.id, 8.0, 9).await;

        let token = test_support::bearer_token(&steady.id, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/leaderboard?timeframe=weekly",
                Some(&token),
                None,
            ))
            .await
            .expect("leaderboard");
        let status = response.status();
        let board = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {board}");

        let top = board["top_three"].as_array().expect("top three");
        assert_eq!(top.len(), 2);
        assert_eq!(top[0]["user_id"], fresh.id.as_str());
        assert_eq!(top[0]["rank_change"], "new");
        // steady was rank 2 last window (behind stale), rank 2 now
        assert_eq!(top[1]["user_id"], steady.id.as_str());
        assert_eq!(top[1]["rank_change"], 0);
        assert!(top.iter().all(|entry| entry["user_id"] != stale.id.as_str()));

        let viewer = &board["user_rank"];
        assert_eq!(viewer["position"], 2);
        assert_eq!(viewer["score"], 4.0);
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres"]
    async fn subject_filter_matches_case_insensitively() {
        let ctx = test_support::setup_test_context().await;
        let db = ctx.state.db();

        let one = test_support::insert_user(db, "one@example.com", "One", "pass-word1", UserRole::Student).await;
        let two = test_support::insert_user(db, "two@example.com", "Two", "pass-word1", UserRole::Student).await;

        let physics = test_support::insert_exam(db, "Physics Mock", "Physics", 10).await;
        let maths = test_support::insert_exam(db, "Maths Mock", "Maths", 10).await;

        insert_result(db, &one.id, &physics.id, 6.0, 1).await;
        insert_result(db, &two.id, &maths.id, 9.0, 1).await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/leaderboard?subject=physics",
                None,
                None,
            ))
            .await
            .expect("leaderboard");
        let status = response.status();
        let board = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {board}");

        let top = board["top_three"].as_array().expect("top three");
        assert_eq!(top.len(), 1);
        assert_eq!(top[0]["user_id"], one.id.as_str());
        // anonymous request carries no viewer standing
        assert!(board["user_rank"].is_null());
    }
}
