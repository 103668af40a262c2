use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Exam;

pub(crate) const COLUMNS: &str = "\
    id, title, description, subject, student_class, duration_minutes, \
    total_marks, total_questions, is_active, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_active(pool: &PgPool) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE is_active ORDER BY created_at DESC",
    ))
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateExam<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub subject: &'a str,
    pub student_class: &'a str,
    pub duration_minutes: i32,
    pub total_marks: i32,
    pub total_questions: i32,
    pub is_active: bool,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateExam<'_>) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            id, title, description, subject, student_class, duration_minutes,
            total_marks, total_questions, is_active, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.subject)
    .bind(params.student_class)
    .bind(params.duration_minutes)
    .bind(params.total_marks)
    .bind(params.total_questions)
    .bind(params.is_active)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateExam {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub student_class: Option<String>,
    pub duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateExam,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            subject = COALESCE($3, subject),
            student_class = COALESCE($4, student_class),
            duration_minutes = COALESCE($5, duration_minutes),
            is_active = COALESCE($6, is_active),
            updated_at = $7
         WHERE id = $8
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.subject)
    .bind(params.student_class)
    .bind(params.duration_minutes)
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Questions and results cascade via their foreign keys.
pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
    let done = sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(pool).await?;
    Ok(done.rows_affected())
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exams").fetch_one(pool).await
}

pub(crate) async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exams WHERE is_active").fetch_one(pool).await
}

pub(crate) async fn distinct_active_subjects(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT DISTINCT subject FROM exams WHERE is_active ORDER BY subject")
        .fetch_all(pool)
        .await
}
