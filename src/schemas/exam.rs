use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Exam, Question, QuestionOption};
use crate::db::types::DifficultyLevel;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[validate(length(min = 1, message = "subject must not be empty"))]
    pub(crate) subject: String,
    #[serde(default = "default_student_class")]
    #[serde(alias = "studentClass")]
    pub(crate) student_class: String,
    #[serde(alias = "duration")]
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    #[serde(alias = "totalQuestions")]
    #[validate(range(min = 1, message = "total_questions must be positive"))]
    pub(crate) total_questions: i32,
    #[serde(default = "default_true")]
    #[serde(alias = "isActive")]
    pub(crate) is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default)]
    #[serde(alias = "studentClass")]
    pub(crate) student_class: Option<String>,
    #[serde(default)]
    #[serde(alias = "duration")]
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) subject: String,
    pub(crate) student_class: String,
    pub(crate) duration_minutes: i32,
    pub(crate) total_marks: i32,
    pub(crate) total_questions: i32,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            subject: exam.subject,
            student_class: exam.student_class,
            duration_minutes: exam.duration_minutes,
            total_marks: exam.total_marks,
            total_questions: exam.total_questions,
            is_active: exam.is_active,
            created_at: format_primitive(exam.created_at),
            updated_at: format_primitive(exam.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "examId")]
    pub(crate) exam_id: String,
    #[serde(alias = "questionText")]
    #[validate(length(min = 1, message = "question_text must not be empty"))]
    pub(crate) question_text: String,
    #[serde(default)]
    #[serde(alias = "translatedText")]
    pub(crate) translated_text: String,
    #[validate(length(min = 2, message = "a question needs at least two options"))]
    pub(crate) options: Vec<OptionCreate>,
    #[serde(alias = "correctOption")]
    pub(crate) correct_option: i32,
    #[serde(default = "default_marks")]
    pub(crate) marks: i32,
    #[serde(default)]
    #[serde(alias = "negativeMarks")]
    #[validate(range(min = 0.0, message = "negative_marks must be non-negative"))]
    pub(crate) negative_marks: f64,
    #[serde(default = "default_difficulty")]
    pub(crate) difficulty: DifficultyLevel,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct OptionCreate {
    pub(crate) id: i32,
    pub(crate) text: String,
    #[serde(default)]
    #[serde(alias = "translatedText")]
    pub(crate) translated_text: String,
}

impl QuestionCreate {
    /// The answer key must point at one of the declared options.
    pub(crate) fn check_correct_option(&self) -> Result<(), String> {
        if self.options.iter().any(|option| option.id == self.correct_option) {
            Ok(())
        } else {
            Err(format!(
                "correct_option {} does not match any option id",
                self.correct_option
            ))
        }
    }

    pub(crate) fn into_options(self) -> (QuestionCreateFields, Vec<QuestionOption>) {
        let options = self
            .options
            .iter()
            .map(|option| QuestionOption {
                id: option.id,
                text: option.text.clone(),
                translated_text: option.translated_text.clone(),
            })
            .collect();
        let fields = QuestionCreateFields {
            exam_id: self.exam_id,
            question_text: self.question_text,
            translated_text: self.translated_text,
            correct_option: self.correct_option,
            marks: self.marks,
            negative_marks: self.negative_marks,
            difficulty: self.difficulty,
        };
        (fields, options)
    }
}

/// The scalar part of a question payload, after the options are split off.
pub(crate) struct QuestionCreateFields {
    pub(crate) exam_id: String,
    pub(crate) question_text: String,
    pub(crate) translated_text: String,
    pub(crate) correct_option: i32,
    pub(crate) marks: i32,
    pub(crate) negative_marks: f64,
    pub(crate) difficulty: DifficultyLevel,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct BulkQuestions {
    #[validate(length(min = 1, message = "questions must not be empty"))]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionCreate>,
}

/// A question as shown to a student taking the exam: no answer key.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionPublic {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) question_text: String,
    pub(crate) translated_text: String,
    pub(crate) options: Vec<QuestionOption>,
    pub(crate) marks: i32,
    pub(crate) negative_marks: f64,
    pub(crate) difficulty: DifficultyLevel,
}

impl QuestionPublic {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            exam_id: question.exam_id,
            question_text: question.question_text,
            translated_text: question.translated_text,
            options: question.options.0,
            marks: question.marks,
            negative_marks: question.negative_marks,
            difficulty: question.difficulty,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StartExamResponse {
    pub(crate) exam: ExamResponse,
    pub(crate) questions: Vec<QuestionPublic>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LandingStats {
    pub(crate) total_students: i64,
    pub(crate) total_exams: i64,
    pub(crate) subjects: Vec<String>,
}

fn default_student_class() -> String {
    "12".to_string()
}

fn default_true() -> bool {
    true
}

fn default_marks() -> i32 {
    1
}

fn default_difficulty() -> DifficultyLevel {
    DifficultyLevel::Medium
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question_payload(correct: i32) -> QuestionCreate {
        serde_json::from_value(serde_json::json!({
            "examId": "e1",
            "questionText": "2 + 2 = ?",
            "options": [
                {"id": 0, "text": "3"},
                {"id": 1, "text": "4"},
            ],
            "correctOption": correct,
        }))
        .expect("deserialize")
    }

    #[test]
    fn question_defaults_apply() {
        let q = question_payload(1);

        assert_eq!(q.marks, 1);
        assert_eq!(q.negative_marks, 0.0);
        assert!(matches!(q.difficulty, DifficultyLevel::Medium));
        assert_eq!(q.translated_text, "");
        assert!(q.validate().is_ok());
    }

    #[test]
    fn correct_option_must_reference_an_option() {
        assert!(question_payload(1).check_correct_option().is_ok());
        assert!(question_payload(7).check_correct_option().is_err());
    }

    #[test]
    fn public_question_carries_no_answer_key() {
        let value = serde_json::to_value(QuestionPublic {
            id: "q1".into(),
            exam_id: "e1".into(),
            question_text: "t".into(),
            translated_text: "".into(),
            options: vec![],
            marks: 1,
            negative_marks: 0.0,
            difficulty: DifficultyLevel::Easy,
        })
        .expect("serialize");

        assert!(value.get("correct_option").is_none());
    }

    #[test]
    fn exam_create_accepts_duration_alias() {
        let payload: ExamCreate = serde_json::from_value(serde_json::json!({
            "title": "Physics Mock 1",
            "subject": "Physics",
            "duration": 60,
            "totalQuestions": 20,
        }))
        .expect("deserialize");

        assert_eq!(payload.duration_minutes, 60);
        assert_eq!(payload.total_questions, 20);
        assert_eq!(payload.student_class, "12");
        assert!(payload.is_active);
    }
}
