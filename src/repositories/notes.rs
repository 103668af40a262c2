use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Note;

const COLUMNS: &str = "id, title, subject, file_url, kind, downloads, created_at";

pub(crate) struct CreateNote<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub subject: &'a str,
    pub file_url: &'a str,
    pub kind: &'a str,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateNote<'_>) -> Result<Note, sqlx::Error> {
    sqlx::query_as::<_, Note>(&format!(
        "INSERT INTO notes (id, title, subject, file_url, kind, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.subject)
    .bind(params.file_url)
    .bind(params.kind)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    subject: Option<&str>,
    search: Option<&str>,
) -> Result<Vec<Note>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM notes WHERE TRUE"));

    if let Some(subject) = subject {
        builder.push(" AND subject = ");
        builder.push_bind(subject);
    }
    if let Some(search) = search {
        builder.push(" AND title ILIKE ");
        builder.push_bind(format!("%{search}%"));
    }

    builder.push(" ORDER BY created_at DESC");
    builder.build_query_as::<Note>().fetch_all(pool).await
}

pub(crate) struct UpdateNote {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub file_url: Option<String>,
    pub kind: Option<String>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateNote,
) -> Result<Option<Note>, sqlx::Error> {
    sqlx::query_as::<_, Note>(&format!(
        "UPDATE notes SET
            title = COALESCE($1, title),
            subject = COALESCE($2, subject),
            file_url = COALESCE($3, file_url),
            kind = COALESCE($4, kind)
         WHERE id = $5
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.subject)
    .bind(params.file_url)
    .bind(params.kind)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
    let done = sqlx::query("DELETE FROM notes WHERE id = $1").bind(id).execute(pool).await?;
    Ok(done.rows_affected())
}

pub(crate) async fn increment_downloads(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
    let done = sqlx::query("UPDATE notes SET downloads = downloads + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(done.rows_affected())
}
