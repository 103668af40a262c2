use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{ExamResult, RecordedAnswer};
use crate::services::analytics::StudentAttempt;
use crate::services::ranking::RankKey;
use crate::services::standings::WindowRow;

const COLUMNS: &str = "\
    id, user_id, exam_id, score, total_marks, correct_answers, wrong_answers, \
    skipped_answers, accuracy, answers, submitted_at";

/// Entries the leaderboard windows consider before ranking.
const WINDOW_CANDIDATE_CAP: i64 = 100;

pub(crate) struct CreateResult<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub exam_id: &'a str,
    pub score: f64,
    pub total_marks: i32,
    pub correct_answers: i32,
    pub wrong_answers: i32,
    pub skipped_answers: i32,
    pub accuracy: f64,
    pub answers: Vec<RecordedAnswer>,
    pub submitted_at: PrimitiveDateTime,
}

/// Inserts the one-and-only result for (user, exam). A concurrent duplicate
/// loses on the unique constraint; see [`is_duplicate_submission`].
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateResult<'_>,
) -> Result<ExamResult, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "INSERT INTO results (
            id, user_id, exam_id, score, total_marks, correct_answers,
            wrong_answers, skipped_answers, accuracy, answers, submitted_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.exam_id)
    .bind(params.score)
    .bind(params.total_marks)
    .bind(params.correct_answers)
    .bind(params.wrong_answers)
    .bind(params.skipped_answers)
    .bind(params.accuracy)
    .bind(Json(params.answers))
    .bind(params.submitted_at)
    .fetch_one(executor)
    .await
}

pub(crate) fn is_duplicate_submission(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation)
        }
        _ => false,
    }
}

pub(crate) async fn find_by_user_exam(
    pool: &PgPool,
    user_id: &str,
    exam_id: &str,
) -> Result<Option<ExamResult>, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "SELECT {COLUMNS} FROM results WHERE user_id = $1 AND exam_id = $2",
    ))
    .bind(user_id)
    .bind(exam_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn exists_for_user_exam(
    pool: &PgPool,
    user_id: &str,
    exam_id: &str,
) -> Result<bool, sqlx::Error> {
    let found: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM results WHERE user_id = $1 AND exam_id = $2")
            .bind(user_id)
            .bind(exam_id)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

/// The (score, correct) pair of every result for one exam; input to the
/// read-time rank computation.
pub(crate) async fn rank_keys_for_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<RankKey>, sqlx::Error> {
    let rows: Vec<(f64, i32)> =
        sqlx::query_as("SELECT score, correct_answers FROM results WHERE exam_id = $1")
            .bind(exam_id)
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(score, correct_answers)| RankKey { score, correct_answers })
        .collect())
}

/// A result row joined with descriptive fields of its exam.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ResultWithExam {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) exam_id: String,
    pub(crate) score: f64,
    pub(crate) total_marks: i32,
    pub(crate) correct_answers: i32,
    pub(crate) wrong_answers: i32,
    pub(crate) skipped_answers: i32,
    pub(crate) accuracy: f64,
    pub(crate) answers: Json<Vec<RecordedAnswer>>,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) exam_title: String,
    pub(crate) exam_subject: String,
    pub(crate) exam_duration_minutes: i32,
    pub(crate) exam_total_questions: i32,
}

const JOINED_COLUMNS: &str = "\
    r.id, r.user_id, r.exam_id, r.score, r.total_marks, r.correct_answers, \
    r.wrong_answers, r.skipped_answers, r.accuracy, r.answers, r.submitted_at, \
    e.title AS exam_title, e.subject AS exam_subject, \
    e.duration_minutes AS exam_duration_minutes, \
    e.total_questions AS exam_total_questions";

pub(crate) async fn history_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<ResultWithExam>, sqlx::Error> {
    sqlx::query_as::<_, ResultWithExam>(&format!(
        "SELECT {JOINED_COLUMNS}
         FROM results r
         JOIN exams e ON e.id = r.exam_id
         WHERE r.user_id = $1
         ORDER BY r.submitted_at DESC",
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete_by_id_for_user(
    pool: &PgPool,
    result_id: &str,
    user_id: &str,
) -> Result<u64, sqlx::Error> {
    let done = sqlx::query("DELETE FROM results WHERE id = $1 AND user_id = $2")
        .bind(result_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(done.rows_affected())
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM results").fetch_one(pool).await
}

/// Pass/fail split over every result, passing at 40% of that result's own
/// total marks.
pub(crate) async fn pass_fail_counts(
    pool: &PgPool,
    threshold: f64,
) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        "SELECT
            COUNT(*) FILTER (WHERE score >= total_marks * $1),
            COUNT(*) FILTER (WHERE score < total_marks * $1)
         FROM results",
    )
    .bind(threshold)
    .fetch_one(pool)
    .await
}

/// Per-user aggregates for one leaderboard window, ordered by total score
/// then total correct answers, capped before ranking. Bounds are half-open:
/// `since <= submitted_at < until`.
pub(crate) async fn window_rows(
    pool: &PgPool,
    since: Option<PrimitiveDateTime>,
    until: Option<PrimitiveDateTime>,
    subject: Option<&str>,
) -> Result<Vec<WindowRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT r.user_id,
                u.name,
                u.profile_image,
                SUM(r.score) AS total_score,
                SUM(r.correct_answers)::BIGINT AS total_correct,
                COUNT(*)::BIGINT AS exams_taken
         FROM results r
         JOIN users u ON u.id = r.user_id
         JOIN exams e ON e.id = r.exam_id
         WHERE TRUE",
    );

    if let Some(since) = since {
        builder.push(" AND r.submitted_at >= ");
        builder.push_bind(since);
    }
    if let Some(until) = until {
        builder.push(" AND r.submitted_at < ");
        builder.push_bind(until);
    }
    if let Some(subject) = subject {
        builder.push(" AND LOWER(e.subject) = LOWER(");
        builder.push_bind(subject);
        builder.push(")");
    }

    builder.push(
        " GROUP BY r.user_id, u.name, u.profile_image
          ORDER BY total_score DESC, total_correct DESC
          LIMIT ",
    );
    builder.push_bind(WINDOW_CANDIDATE_CAP);

    builder.build_query_as::<WindowRow>().fetch_all(pool).await
}

/// (user, subject, score, total) rows for the admin analytics rollup.
pub(crate) async fn student_attempts(pool: &PgPool) -> Result<Vec<StudentAttempt>, sqlx::Error> {
    let rows: Vec<(String, String, f64, i32)> = sqlx::query_as(
        "SELECT r.user_id, e.subject, r.score, r.total_marks
         FROM results r
         JOIN exams e ON e.id = r.exam_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(user_id, subject, score, total_marks)| StudentAttempt {
            user_id,
            subject,
            score,
            total_marks,
        })
        .collect())
}
