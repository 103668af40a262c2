use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Note;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct NoteCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "subject must not be empty"))]
    pub(crate) subject: String,
    #[serde(alias = "fileUrl")]
    #[validate(url(message = "file_url must be a valid URL"))]
    pub(crate) file_url: String,
    #[serde(default = "default_kind")]
    #[serde(alias = "type")]
    pub(crate) kind: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct NoteUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default)]
    #[serde(alias = "fileUrl")]
    #[validate(url(message = "file_url must be a valid URL"))]
    pub(crate) file_url: Option<String>,
    #[serde(default)]
    #[serde(alias = "type")]
    pub(crate) kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotesQuery {
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default)]
    pub(crate) search: Option<String>,
}

impl NotesQuery {
    pub(crate) fn subject_filter(&self) -> Option<&str> {
        self.subject
            .as_deref()
            .map(str::trim)
            .filter(|subject| !subject.is_empty() && !subject.eq_ignore_ascii_case("all"))
    }

    pub(crate) fn search_filter(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|search| !search.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NoteResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) subject: String,
    pub(crate) file_url: String,
    pub(crate) kind: String,
    pub(crate) downloads: i32,
    pub(crate) created_at: String,
}

impl NoteResponse {
    pub(crate) fn from_db(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            subject: note.subject,
            file_url: note.file_url,
            kind: note.kind,
            downloads: note.downloads,
            created_at: format_primitive(note.created_at),
        }
    }
}

fn default_kind() -> String {
    "PDF".to_string()
}
