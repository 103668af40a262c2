use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use time::Duration;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::repositories;
use crate::schemas::exam::ExamResponse;
use crate::schemas::result::{HistoryEntry, ResultResponse};
use crate::schemas::user::{ChangePassword, ProfileUpdate, UserResponse};
use crate::services::analytics::{self, ScoredAttempt};

/// How many notifications the bell menu shows.
const NOTIFICATION_PAGE: i64 = 20;

/// How many exams get recommended at a time.
const RECOMMENDATION_CAP: usize = 2;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/profile", get(profile).patch(update_profile))
        .route("/change-password", post(change_password))
        .route("/history", get(history))
        .route("/history/:result_id", delete(delete_result))
        .route("/results/:exam_id", get(result_details))
        .route("/notifications", get(notifications).delete(clear_notifications))
        .route("/notifications/read", post(mark_notifications_read))
        .route("/notifications/toggle", post(toggle_notifications))
        .route("/notifications/:notification_id", delete(delete_notification))
}

/// The student home screen: pending vs completed exams, headline stats,
/// subject performance, weekly progress, recommendations and badges.
async fn dashboard(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let exams = repositories::exams::list_active(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;
    let history = repositories::results::history_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch results"))?;
    let totals = repositories::leaderboard::find_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch leaderboard totals"))?;

    let pending: Vec<&crate::db::models::Exam> =
        exams.iter().filter(|exam| !history.iter().any(|row| row.exam_id == exam.id)).collect();

    let total_exams = history.len() as i64;
    let avg_score = if total_exams > 0 {
        let total: f64 = history.iter().map(|row| row.score).sum();
        (total / total_exams as f64 * 10.0).round() / 10.0
    } else {
        0.0
    };

    let attempts: Vec<ScoredAttempt> = history
        .iter()
        .map(|row| ScoredAttempt {
            subject: row.exam_subject.clone(),
            score: row.score,
            total_marks: row.total_marks,
        })
        .collect();
    let subject_performance = analytics::subject_averages(&attempts);

    let week_ago = primitive_now_utc() - Duration::days(7);
    let exams_this_week = history.iter().filter(|row| row.submitted_at > week_ago).count() as i64;

    let mut recommendations: Vec<&&crate::db::models::Exam> =
        match analytics::weakest_subject(&subject_performance) {
            Some(weakest) => pending
                .iter()
                .filter(|exam| exam.subject == weakest)
                .take(RECOMMENDATION_CAP)
                .collect(),
            None => Vec::new(),
        };
    if recommendations.is_empty() {
        recommendations = pending.iter().take(RECOMMENDATION_CAP).collect();
    }

    let badges = analytics::earned_badges(&attempts, exams_this_week);

    let pending_exams: Vec<ExamResponse> =
        pending.iter().map(|exam| ExamResponse::from_db((*exam).clone())).collect();
    let recommended: Vec<ExamResponse> =
        recommendations.iter().map(|exam| ExamResponse::from_db((**exam).clone())).collect();
    let completed: Vec<HistoryEntry> =
        history.into_iter().map(HistoryEntry::from_row).collect();

    Ok(Json(serde_json::json!({
        "pending_exams": pending_exams,
        "completed_exams": completed,
        "stats": {
            "total_exams": total_exams,
            "avg_score": avg_score,
            "total_score": totals.as_ref().map(|row| row.total_score).unwrap_or(0.0),
        },
        "analytics": {
            "subject_performance": subject_performance,
            "weekly_progress": {
                "current": exams_this_week,
                "target": analytics::WEEKLY_GOAL,
            },
            "recommendations": recommended,
            "badges": badges,
        }
    })))
}

async fn profile(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn update_profile(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let updated = repositories::users::update_profile(
        state.db(),
        &user.id,
        repositories::users::UpdateProfile {
            name: payload.name,
            student_class: payload.student_class,
            stream: payload.stream,
            profile_image: payload.profile_image,
            bio: payload.bio,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update profile"))?;

    let Some(updated) = updated else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    Ok(Json(UserResponse::from_db(updated)))
}

async fn change_password(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ChangePassword>,
) -> Result<Json<serde_json::Value>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let verified = security::verify_password(&payload.current_password, &user.hashed_password)
        .map_err(|e| ApiError::internal(e, "Failed to verify password"))?;
    if !verified {
        return Err(ApiError::BadRequest("Incorrect current password".to_string()));
    }

    let hashed = security::hash_password(&payload.new_password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    repositories::users::update_password(state.db(), &user.id, &hashed, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update password"))?;

    Ok(Json(serde_json::json!({ "message": "Password updated successfully" })))
}

async fn history(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let rows = repositories::results::history_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch history"))?;

    Ok(Json(rows.into_iter().map(HistoryEntry::from_row).collect()))
}

async fn result_details(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ResultResponse>, ApiError> {
    let result = repositories::results::find_by_user_exam(state.db(), &user.id, &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch result"))?;

    let Some(result) = result else {
        return Err(ApiError::NotFound("Result not found".to_string()));
    };

    let questions = repositories::questions::all_for_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    Ok(Json(ResultResponse::from_db(result, questions)))
}

async fn delete_result(
    Path(result_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = repositories::results::delete_by_id_for_user(state.db(), &result_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete result"))?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Result not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Result deleted successfully" })))
}

async fn notifications(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<serde_json::Value>>, ApiError> {
    let items =
        repositories::notifications::list_for_user(state.db(), &user.id, NOTIFICATION_PAGE)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch notifications"))?;

    Ok(Json(
        items
            .into_iter()
            .map(|item| {
                serde_json::json!({
                    "id": item.id,
                    "title": item.title,
                    "message": item.message,
                    "is_read": item.is_read,
                    "created_at": format_primitive(item.created_at),
                })
            })
            .collect(),
    ))
}

async fn mark_notifications_read(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    repositories::notifications::mark_all_read(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to mark notifications read"))?;

    Ok(Json(serde_json::json!({ "message": "Notifications marked as read" })))
}

async fn toggle_notifications(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let enabled =
        repositories::users::toggle_notifications(state.db(), &user.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to toggle notifications"))?;

    let Some(enabled) = enabled else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    Ok(Json(serde_json::json!({ "enabled": enabled })))
}

async fn delete_notification(
    Path(notification_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted =
        repositories::notifications::delete_one_for_user(state.db(), &notification_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to delete notification"))?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Notification deleted" })))
}

async fn clear_notifications(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    repositories::notifications::delete_all_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to clear notifications"))?;

    Ok(Json(serde_json::json!({ "message": "All notifications cleared" })))
}
