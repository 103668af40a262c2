use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{Question, QuestionOption};
use crate::db::types::DifficultyLevel;
use crate::services::scoring::AnswerKey;

const COLUMNS: &str = "\
    id, exam_id, question_text, translated_text, options, correct_option, \
    marks, negative_marks, difficulty, order_index, created_at";

pub(crate) struct CreateQuestion {
    pub id: String,
    pub exam_id: String,
    pub question_text: String,
    pub translated_text: String,
    pub options: Vec<QuestionOption>,
    pub correct_option: i32,
    pub marks: i32,
    pub negative_marks: f64,
    pub difficulty: DifficultyLevel,
    pub order_index: i32,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, exam_id, question_text, translated_text, options, correct_option,
            marks, negative_marks, difficulty, order_index, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.question_text)
    .bind(params.translated_text)
    .bind(Json(params.options))
    .bind(params.correct_option)
    .bind(params.marks)
    .bind(params.negative_marks)
    .bind(params.difficulty)
    .bind(params.order_index)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn create_many(
    pool: &PgPool,
    questions: Vec<CreateQuestion>,
) -> Result<u64, sqlx::Error> {
    if questions.is_empty() {
        return Ok(0);
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO questions (
            id, exam_id, question_text, translated_text, options, correct_option,
            marks, negative_marks, difficulty, order_index, created_at
        ) ",
    );
    builder.push_values(questions, |mut row, question| {
        row.push_bind(question.id)
            .push_bind(question.exam_id)
            .push_bind(question.question_text)
            .push_bind(question.translated_text)
            .push_bind(Json(question.options))
            .push_bind(question.correct_option)
            .push_bind(question.marks)
            .push_bind(question.negative_marks)
            .push_bind(question.difficulty)
            .push_bind(question.order_index)
            .push_bind(question.created_at);
    });

    let done = builder.build().execute(pool).await?;
    Ok(done.rows_affected())
}

/// The full question set in authoring order. `limit` caps how many a paper
/// may hold; pass i64::MAX semantics via a large cap from the caller.
pub(crate) async fn list_for_exam(
    pool: &PgPool,
    exam_id: &str,
    limit: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions
         WHERE exam_id = $1
         ORDER BY order_index, id
         LIMIT $2",
    ))
    .bind(exam_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// The complete question set in authoring order, answer keys included.
pub(crate) async fn all_for_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions
         WHERE exam_id = $1
         ORDER BY order_index, id",
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

/// Just the grading fields, in authoring order, for the submission engine.
pub(crate) async fn answer_keys_for_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<AnswerKey>, sqlx::Error> {
    let rows: Vec<(String, i32, f64)> = sqlx::query_as(
        "SELECT id, correct_option, negative_marks FROM questions
         WHERE exam_id = $1
         ORDER BY order_index, id",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(question_id, correct_option, negative_marks)| AnswerKey {
            question_id,
            correct_option,
            negative_marks,
        })
        .collect())
}

pub(crate) async fn next_order_index(pool: &PgPool, exam_id: &str) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(MAX(order_index) + 1, 0) FROM questions WHERE exam_id = $1")
        .bind(exam_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions").fetch_one(pool).await
}
