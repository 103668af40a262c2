use sqlx::PgPool;

use crate::db::models::Subject;

const COLUMNS: &str = "id, name, description, is_active";

pub(crate) async fn list_active(pool: &PgPool) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "SELECT {COLUMNS} FROM subjects WHERE is_active ORDER BY name",
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn exists_by_name(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
    let found: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM subjects WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    name: &str,
    description: Option<&str>,
) -> Result<Subject, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "INSERT INTO subjects (id, name, description, is_active)
         VALUES ($1,$2,$3,TRUE)
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}
