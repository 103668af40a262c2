use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::db::models::Subject;
use crate::repositories;

#[derive(Debug, Deserialize, Validate)]
struct SubjectCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubjectResponse {
    id: String,
    name: String,
    description: Option<String>,
    is_active: bool,
}

impl SubjectResponse {
    fn from_db(subject: Subject) -> Self {
        Self {
            id: subject.id,
            name: subject.name,
            description: subject.description,
            is_active: subject.is_active,
        }
    }
}

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_subjects).post(create_subject))
}

async fn list_subjects(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubjectResponse>>, ApiError> {
    let subjects = repositories::subjects::list_active(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;

    Ok(Json(subjects.into_iter().map(SubjectResponse::from_db).collect()))
}

async fn create_subject(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<SubjectCreate>,
) -> Result<(StatusCode, Json<SubjectResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let exists = repositories::subjects::exists_by_name(state.db(), &payload.name)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing subject"))?;
    if exists {
        return Err(ApiError::Conflict("Subject already exists".to_string()));
    }

    let subject = repositories::subjects::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        &payload.name,
        payload.description.as_deref(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create subject"))?;

    Ok((StatusCode::CREATED, Json(SubjectResponse::from_db(subject))))
}
