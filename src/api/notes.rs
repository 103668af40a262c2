use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::note::{NoteCreate, NoteResponse, NotesQuery, NoteUpdate};
use crate::services::notify;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notes).post(create_note))
        .route("/:note_id", axum::routing::patch(update_note).delete(delete_note))
        .route("/:note_id/download", post(track_download))
}

async fn list_notes(
    Query(params): Query<NotesQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    let notes = repositories::notes::list(
        state.db(),
        params.subject_filter(),
        params.search_filter(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list notes"))?;

    Ok(Json(notes.into_iter().map(NoteResponse::from_db).collect()))
}

async fn create_note(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<NoteCreate>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let note = repositories::notes::create(
        state.db(),
        repositories::notes::CreateNote {
            id: &Uuid::new_v4().to_string(),
            title: &payload.title,
            subject: &payload.subject,
            file_url: &payload.file_url,
            kind: &payload.kind,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create note"))?;

    notify::broadcast_best_effort(
        state.db(),
        "New Study Material",
        &format!("New notes \"{}\" for {} have been uploaded.", note.title, note.subject),
    )
    .await;

    Ok((StatusCode::CREATED, Json(NoteResponse::from_db(note))))
}

async fn update_note(
    Path(note_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<NoteUpdate>,
) -> Result<Json<NoteResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let note = repositories::notes::update(
        state.db(),
        &note_id,
        repositories::notes::UpdateNote {
            title: payload.title,
            subject: payload.subject,
            file_url: payload.file_url,
            kind: payload.kind,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update note"))?;

    let Some(note) = note else {
        return Err(ApiError::NotFound("Note not found".to_string()));
    };

    Ok(Json(NoteResponse::from_db(note)))
}

async fn delete_note(
    Path(note_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = repositories::notes::delete_by_id(state.db(), &note_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete note"))?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Note not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Note deleted" })))
}

async fn track_download(
    Path(note_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = repositories::notes::increment_downloads(state.db(), &note_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to track download"))?;

    if updated == 0 {
        return Err(ApiError::NotFound("Note not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Download tracked" })))
}
