use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Exam;
use crate::repositories;
use crate::schemas::exam::{
    ExamResponse, ExamUpdate, LandingStats, QuestionPublic, StartExamResponse,
};
use crate::schemas::result::{ResultResponse, SubmissionReceipt, SubmitExamRequest};
use crate::services::ranking;
use crate::services::scoring;

/// Paper size when an exam does not pin its own question count.
const DEFAULT_PAPER_CAP: i64 = 100;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_exams))
        .route("/public/stats", get(landing_stats))
        .route("/:exam_id", axum::routing::patch(update_exam).delete(delete_exam))
        .route("/:exam_id/start", post(start_exam))
        .route("/:exam_id/submit", post(submit_exam))
        .route("/:exam_id/result", get(exam_result))
}

async fn landing_stats(State(state): State<AppState>) -> Result<Json<LandingStats>, ApiError> {
    let total_students = repositories::users::count_students(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;
    let total_exams = repositories::exams::count_active(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exams"))?;
    let subjects = repositories::exams::distinct_active_subjects(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;

    Ok(Json(LandingStats { total_students, total_exams, subjects }))
}

async fn list_exams(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let exams = repositories::exams::list_active(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(exams.into_iter().map(ExamResponse::from_db).collect()))
}

/// Hands out the paper: the ordered question set with the answer key
/// stripped. Refused once the user already holds a result for the exam.
async fn start_exam(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<StartExamResponse>, ApiError> {
    let exam = fetch_active_exam(&state, &exam_id).await?;

    let attempted = repositories::results::exists_for_user_exam(state.db(), &user.id, &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check prior attempts"))?;
    if attempted {
        return Err(ApiError::Conflict("You have already attempted this exam".to_string()));
    }

    let cap = if exam.total_questions > 0 {
        i64::from(exam.total_questions)
    } else {
        DEFAULT_PAPER_CAP
    };
    let questions = repositories::questions::list_for_exam(state.db(), &exam_id, cap)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    tracing::info!(exam_id = %exam_id, user_id = %user.id, questions = questions.len(), "Exam started");

    Ok(Json(StartExamResponse {
        exam: ExamResponse::from_db(exam),
        questions: questions.into_iter().map(QuestionPublic::from_db).collect(),
    }))
}

/// Grades a submission against the stored question set and persists the
/// one-and-only result for (user, exam), bumping the leaderboard totals in
/// the same transaction.
async fn submit_exam(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitExamRequest>,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    let _exam = fetch_active_exam(&state, &exam_id).await?;

    let attempted = repositories::results::exists_for_user_exam(state.db(), &user.id, &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check prior attempts"))?;
    if attempted {
        return Err(ApiError::Conflict("Exam already submitted".to_string()));
    }

    let keys = repositories::questions::answer_keys_for_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch answer keys"))?;

    let card = scoring::score_submission(&keys, &payload.answers);
    let now = primitive_now_utc();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let result = repositories::results::create(
        &mut *tx,
        repositories::results::CreateResult {
            id: &Uuid::new_v4().to_string(),
            user_id: &user.id,
            exam_id: &exam_id,
            score: card.score,
            total_marks: card.total_marks,
            correct_answers: card.correct_answers,
            wrong_answers: card.wrong_answers,
            skipped_answers: card.skipped_answers,
            accuracy: card.accuracy,
            answers: card.answers,
            submitted_at: now,
        },
    )
    .await
    .map_err(|e| {
        // the racing duplicate loses on the unique index, not the pre-check
        if repositories::results::is_duplicate_submission(&e) {
            ApiError::Conflict("Exam already submitted".to_string())
        } else {
            ApiError::internal(e, "Failed to save result")
        }
    })?;

    repositories::leaderboard::apply_submission(&mut *tx, &user.id, result.score, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update leaderboard totals"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::counter!("exam_submissions_total").increment(1);
    tracing::info!(
        exam_id = %exam_id,
        user_id = %user.id,
        score = result.score,
        total_marks = result.total_marks,
        "Exam submitted"
    );

    Ok(Json(SubmissionReceipt {
        score: result.score,
        total_marks: result.total_marks,
        correct_answers: result.correct_answers,
        wrong_answers: result.wrong_answers,
    }))
}

/// Full result detail plus rank and percentile, computed over every result
/// of the exam at read time.
async fn exam_result(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = repositories::results::find_by_user_exam(state.db(), &user.id, &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch result"))?;

    let Some(result) = result else {
        return Err(ApiError::NotFound("Result not found".to_string()));
    };

    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let participants = repositories::results::rank_keys_for_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam results"))?;
    let standing = ranking::rank_of(
        &participants,
        ranking::RankKey { score: result.score, correct_answers: result.correct_answers },
    );

    let questions = repositories::questions::all_for_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    let detail = ResultResponse::from_db(result, questions);
    let mut value = serde_json::to_value(detail)
        .map_err(|e| ApiError::internal(e, "Failed to serialize result"))?;
    value["rank"] = serde_json::json!(standing.rank);
    value["percentile"] = serde_json::json!(standing.percentile);
    value["exam"] = serde_json::json!({
        "id": exam.id,
        "title": exam.title,
        "subject": exam.subject,
        "total_marks": exam.total_marks,
        "total_questions": exam.total_questions,
    });

    Ok(Json(value))
}

async fn update_exam(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ExamUpdate>,
) -> Result<Json<ExamResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let exam = repositories::exams::update(
        state.db(),
        &exam_id,
        repositories::exams::UpdateExam {
            title: payload.title,
            description: payload.description,
            subject: payload.subject,
            student_class: payload.student_class,
            duration_minutes: payload.duration_minutes,
            is_active: payload.is_active,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam"))?;

    let Some(exam) = exam else {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    };

    Ok(Json(ExamResponse::from_db(exam)))
}

async fn delete_exam(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = repositories::exams::delete_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Exam deleted successfully" })))
}

async fn fetch_active_exam(state: &AppState, exam_id: &str) -> Result<Exam, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;

    let Some(exam) = exam else {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    };

    if !exam.is_active {
        return Err(ApiError::BadRequest("Exam is not active".to_string()));
    }

    Ok(exam)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::db::types::UserRole;
    use crate::repositories;
    use crate::test_support;

    fn answers_body(pairs: &[(&str, i32)]) -> serde_json::Value {
        let answers: HashMap<String, i32> =
            pairs.iter().map(|(id, option)| (id.to_string(), *option)).collect();
        json!({ "answers": answers })
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres"]
    async fn start_submit_and_rank_full_flow() {
        let ctx = test_support::setup_test_context().await;

        let student = test_support::insert_user(
            ctx.state.db(),
            "student@example.com",
            "Student One",
            "student-pass",
            UserRole::Student,
        )
        .await;
        let exam = test_support::insert_exam(ctx.state.db(), "Physics Mock 1", "Physics", 2).await;
        let q1 = test_support::insert_question(ctx.state.db(), &exam.id, 0, 1, 0.0).await;
        let q2 = test_support::insert_question(ctx.state.db(), &exam.id, 1, 0, 0.25).await;
        let token = test_support::bearer_token(&student.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/exams/{}/start", exam.id),
                Some(&token),
                None,
            ))
            .await
            .expect("start exam");
        let status = response.status();
        let paper = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {paper}");

        let questions = paper["questions"].as_array().expect("questions");
        assert_eq!(questions.len(), 2);
        // the paper never carries the answer key
        assert!(questions.iter().all(|q| q.get("correct_option").is_none()));
        assert_eq!(questions[0]["id"], q1.id.as_str());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/exams/{}/submit", exam.id),
                Some(&token),
                Some(answers_body(&[(&q1.id, 1), (&q2.id, 2)])),
            ))
            .await
            .expect("submit exam");
        let status = response.status();
        let receipt = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {receipt}");
        assert_eq!(receipt["score"], 0.75);
        assert_eq!(receipt["total_marks"], 2);
        assert_eq!(receipt["correct_answers"], 1);
        assert_eq!(receipt["wrong_answers"], 1);

        // a retry must not double-score
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/exams/{}/submit", exam.id),
                Some(&token),
                Some(answers_body(&[(&q1.id, 1)])),
            ))
            .await
            .expect("resubmit exam");
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let totals = repositories::leaderboard::find_for_user(ctx.state.db(), &student.id)
            .await
            .expect("totals query")
            .expect("totals row");
        assert_eq!(totals.total_score, 0.75);
        assert_eq!(totals.exams_attempted, 1);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/exams/{}/result", exam.id),
                Some(&token),
                None,
            ))
            .await
            .expect("fetch result");
        let status = response.status();
        let detail = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {detail}");
        assert_eq!(detail["rank"], 1);
        assert_eq!(detail["percentile"], 0);
        assert_eq!(detail["accuracy"], 50.0);
        assert_eq!(detail["skipped_answers"], 0);
        // the review reveals the key after submission
        assert_eq!(detail["answers"][0]["correct_option"], 1);
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres"]
    async fn empty_submission_scores_all_skipped() {
        let ctx = test_support::setup_test_context().await;

        let student = test_support::insert_user(
            ctx.state.db(),
            "idle@example.com",
            "Idle Student",
            "student-pass",
            UserRole::Student,
        )
        .await;
        let exam = test_support::insert_exam(ctx.state.db(), "Maths Mock 1", "Maths", 2).await;
        test_support::insert_question(ctx.state.db(), &exam.id, 0, 1, 0.0).await;
        test_support::insert_question(ctx.state.db(), &exam.id, 1, 0, 0.25).await;
        let token = test_support::bearer_token(&student.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/exams/{}/submit", exam.id),
                Some(&token),
                Some(json!({ "answers": {} })),
            ))
            .await
            .expect("submit exam");
        let status = response.status();
        let receipt = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {receipt}");
        assert_eq!(receipt["score"], 0.0);
        assert_eq!(receipt["correct_answers"], 0);
        assert_eq!(receipt["wrong_answers"], 0);

        let result =
            repositories::results::find_by_user_exam(ctx.state.db(), &student.id, &exam.id)
                .await
                .expect("result query")
                .expect("result row");
        assert_eq!(result.skipped_answers, 2);
        assert_eq!(result.accuracy, 0.0);
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres"]
    async fn unknown_exam_is_not_found() {
        let ctx = test_support::setup_test_context().await;

        let student = test_support::insert_user(
            ctx.state.db(),
            "lost@example.com",
            "Lost Student",
            "student-pass",
            UserRole::Student,
        )
        .await;
        let token = test_support::bearer_token(&student.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/exams/no-such-exam/submit",
                Some(&token),
                Some(json!({ "answers": {} })),
            ))
            .await
            .expect("submit exam");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
