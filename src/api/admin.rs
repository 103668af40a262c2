use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::{BulkQuestions, ExamCreate, ExamResponse, QuestionCreate};
use crate::schemas::result::HistoryEntry;
use crate::schemas::user::UserResponse;
use crate::services::analytics::{self, StudentRecord, StudentSummary};
use crate::services::notify;

const RECENT_SIGNUPS: i64 = 5;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/analytics", get(student_analytics))
        .route("/exams", post(create_exam))
        .route("/questions", post(add_question))
        .route("/questions/bulk", post(bulk_add_questions))
        .route("/users", get(list_users))
        .route("/users/:user_id", delete(delete_user))
        .route("/users/:user_id/results", get(user_results))
}

async fn dashboard(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let total_students = repositories::users::count_students(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;
    let total_exams = repositories::exams::count_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exams"))?;
    let total_questions = repositories::questions::count_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;
    let total_attempts = repositories::results::count_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count results"))?;

    let (passed, failed) =
        repositories::results::pass_fail_counts(state.db(), analytics::PASS_THRESHOLD)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to compute pass/fail split"))?;

    let recent = repositories::users::recent_students(state.db(), RECENT_SIGNUPS)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list recent signups"))?;
    let recent_users: Vec<UserResponse> =
        recent.into_iter().map(UserResponse::from_db).collect();

    Ok(Json(serde_json::json!({
        "stats": {
            "total_students": total_students,
            "total_exams": total_exams,
            "total_questions": total_questions,
            "total_attempts": total_attempts,
            "passed": passed,
            "failed": failed,
        },
        "recent_users": recent_users,
    })))
}

async fn student_analytics(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentSummary>>, ApiError> {
    let students = repositories::users::list_students(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;
    let attempts = repositories::results::student_attempts(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempts"))?;

    let records = students
        .into_iter()
        .map(|user| StudentRecord { id: user.id, name: user.name, email: user.email })
        .collect();

    Ok(Json(analytics::student_analytics(records, &attempts)))
}

async fn create_exam(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            title: &payload.title,
            description: &payload.description,
            subject: &payload.subject,
            student_class: &payload.student_class,
            duration_minutes: payload.duration_minutes,
            // one mark per question, no partial credit
            total_marks: payload.total_questions,
            total_questions: payload.total_questions,
            is_active: payload.is_active,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    notify::broadcast_best_effort(
        state.db(),
        "New Exam Added",
        &format!("A new exam \"{}\" is now available in {}.", exam.title, exam.subject),
    )
    .await;

    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam))))
}

async fn add_question(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    payload.check_correct_option().map_err(ApiError::BadRequest)?;

    let exam = repositories::exams::find_by_id(state.db(), &payload.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;
    let Some(exam) = exam else {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    };

    let order_index = repositories::questions::next_order_index(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to determine question order"))?;

    let (fields, options) = payload.into_options();
    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: Uuid::new_v4().to_string(),
            exam_id: fields.exam_id,
            question_text: fields.question_text,
            translated_text: fields.translated_text,
            options,
            correct_option: fields.correct_option,
            marks: fields.marks,
            negative_marks: fields.negative_marks,
            difficulty: fields.difficulty,
            order_index,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    notify::broadcast_best_effort(
        state.db(),
        "Exam Updated",
        &format!("New questions added to \"{}\".", exam.title),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Question added",
            "question_id": question.id,
        })),
    ))
}

async fn bulk_add_questions(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<BulkQuestions>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    for question in &payload.questions {
        question.check_correct_option().map_err(ApiError::BadRequest)?;
    }

    // next free order index per exam, questions appended in payload order
    let mut next_index: HashMap<String, i32> = HashMap::new();
    let now = primitive_now_utc();
    let mut rows = Vec::with_capacity(payload.questions.len());

    for question in payload.questions {
        let index = match next_index.get_mut(&question.exam_id) {
            Some(index) => {
                *index += 1;
                *index
            }
            None => {
                let start =
                    repositories::questions::next_order_index(state.db(), &question.exam_id)
                        .await
                        .map_err(|e| {
                            ApiError::internal(e, "Failed to determine question order")
                        })?;
                next_index.insert(question.exam_id.clone(), start);
                start
            }
        };

        let (fields, options) = question.into_options();
        rows.push(repositories::questions::CreateQuestion {
            id: Uuid::new_v4().to_string(),
            exam_id: fields.exam_id,
            question_text: fields.question_text,
            translated_text: fields.translated_text,
            options,
            correct_option: fields.correct_option,
            marks: fields.marks,
            negative_marks: fields.negative_marks,
            difficulty: fields.difficulty,
            order_index: index,
            created_at: now,
        });
    }

    let created = repositories::questions::create_many(state.db(), rows).await.map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if matches!(db_err.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) {
                return ApiError::BadRequest("Questions reference an unknown exam".to_string());
            }
        }
        ApiError::internal(e, "Failed to create questions")
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": format!("{created} questions added") })),
    ))
}

async fn list_users(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let students = repositories::users::list_students(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(students.into_iter().map(UserResponse::from_db).collect()))
}

async fn user_results(
    Path(user_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let rows = repositories::results::history_for_user(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch results"))?;

    Ok(Json(rows.into_iter().map(HistoryEntry::from_row).collect()))
}

async fn delete_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if admin.id == user_id {
        return Err(ApiError::BadRequest("Cannot delete your own account".to_string()));
    }

    let deleted = repositories::users::delete_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete user"))?;

    if deleted == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "User deleted successfully" })))
}
