use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{DifficultyLevel, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) name: String,
    pub(crate) role: UserRole,
    pub(crate) student_class: Option<String>,
    pub(crate) stream: Option<String>,
    pub(crate) profile_image: Option<String>,
    pub(crate) bio: Option<String>,
    pub(crate) notifications_enabled: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Subject {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) subject: String,
    pub(crate) student_class: String,
    pub(crate) duration_minutes: i32,
    pub(crate) total_marks: i32,
    pub(crate) total_questions: i32,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One selectable option of a multiple-choice question. Stored inline on the
/// question row as JSONB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct QuestionOption {
    pub(crate) id: i32,
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) translated_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) question_text: String,
    pub(crate) translated_text: String,
    pub(crate) options: Json<Vec<QuestionOption>>,
    /// Write-only answer key; stripped from anything a test-taker sees.
    pub(crate) correct_option: i32,
    pub(crate) marks: i32,
    pub(crate) negative_marks: f64,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

/// One recorded answer inside a result; selected_option is -1 for skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RecordedAnswer {
    pub(crate) question_id: String,
    pub(crate) selected_option: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamResult {
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
}

/// Denormalized running totals, bumped inside the submission transaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct LeaderboardTotal {
    pub(crate) user_id: String,
    pub(crate) total_score: f64,
    pub(crate) exams_attempted: i32,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Note {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) subject: String,
    pub(crate) file_url: String,
    pub(crate) kind: String,
    pub(crate) downloads: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Notification {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) is_read: bool,
    pub(crate) created_at: PrimitiveDateTime,
}
