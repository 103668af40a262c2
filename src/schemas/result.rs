use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::{ExamResult, Question, QuestionOption};
use crate::repositories::results::ResultWithExam;

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitExamRequest {
    pub(crate) answers: HashMap<String, i32>,
}

/// Confirmation payload returned right after grading.
#[derive(Debug, Serialize)]
pub(crate) struct SubmissionReceipt {
    pub(crate) score: f64,
    pub(crate) total_marks: i32,
    pub(crate) correct_answers: i32,
    pub(crate) wrong_answers: i32,
}

/// One reviewed answer in the result detail: the learner's pick next to the
/// revealed answer key.
#[derive(Debug, Serialize)]
pub(crate) struct AnswerReview {
    pub(crate) question_id: String,
    pub(crate) selected_option: i32,
    pub(crate) question_text: String,
    pub(crate) options: Vec<QuestionOption>,
    pub(crate) correct_option: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) exam_id: String,
    pub(crate) score: f64,
    pub(crate) total_marks: i32,
    pub(crate) correct_answers: i32,
    pub(crate) wrong_answers: i32,
    pub(crate) skipped_answers: i32,
    pub(crate) accuracy: f64,
    pub(crate) submitted_at: String,
    pub(crate) answers: Vec<AnswerReview>,
}

impl ResultResponse {
    /// Joins the recorded answers against the exam's question set. Answers
    /// whose question has since been deleted are dropped from the review.
    pub(crate) fn from_db(result: ExamResult, questions: Vec<Question>) -> Self {
        let by_id: HashMap<String, Question> =
            questions.into_iter().map(|question| (question.id.clone(), question)).collect();

        let answers = result
            .answers
            .0
            .into_iter()
            .filter_map(|answer| {
                by_id.get(&answer.question_id).map(|question| AnswerReview {
                    question_id: answer.question_id,
                    selected_option: answer.selected_option,
                    question_text: question.question_text.clone(),
                    options: question.options.0.clone(),
                    correct_option: question.correct_option,
                })
            })
            .collect();

        Self {
            id: result.id,
            user_id: result.user_id,
            exam_id: result.exam_id,
            score: result.score,
            total_marks: result.total_marks,
            correct_answers: result.correct_answers,
            wrong_answers: result.wrong_answers,
            skipped_answers: result.skipped_answers,
            accuracy: result.accuracy,
            submitted_at: format_primitive(result.submitted_at),
            answers,
        }
    }
}

/// A past attempt with its exam's descriptive fields, for history lists.
#[derive(Debug, Serialize)]
pub(crate) struct HistoryEntry {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) exam_subject: String,
    pub(crate) exam_duration_minutes: i32,
    pub(crate) exam_total_questions: i32,
    pub(crate) score: f64,
    pub(crate) total_marks: i32,
    pub(crate) correct_answers: i32,
    pub(crate) wrong_answers: i32,
    pub(crate) skipped_answers: i32,
    pub(crate) accuracy: f64,
    pub(crate) submitted_at: String,
}

impl HistoryEntry {
    pub(crate) fn from_row(row: ResultWithExam) -> Self {
        Self {
            id: row.id,
            exam_id: row.exam_id,
            exam_title: row.exam_title,
            exam_subject: row.exam_subject,
            exam_duration_minutes: row.exam_duration_minutes,
            exam_total_questions: row.exam_total_questions,
            score: row.score,
            total_marks: row.total_marks,
            correct_answers: row.correct_answers,
            wrong_answers: row.wrong_answers,
            skipped_answers: row.skipped_answers,
            accuracy: row.accuracy,
            submitted_at: format_primitive(row.submitted_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;
    use time::macros::datetime;

    use crate::db::models::RecordedAnswer;
    use crate::db::types::DifficultyLevel;

    fn question(id: &str, correct: i32) -> Question {
        Question {
            id: id.to_string(),
            exam_id: "e1".to_string(),
            question_text: format!("text {id}"),
            translated_text: String::new(),
            options: Json(vec![
                QuestionOption { id: 0, text: "a".into(), translated_text: String::new() },
                QuestionOption { id: 1, text: "b".into(), translated_text: String::new() },
            ]),
            correct_option: correct,
            marks: 1,
            negative_marks: 0.0,
            difficulty: DifficultyLevel::Medium,
            order_index: 0,
            created_at: datetime!(2025-01-01 00:00:00),
        }
    }

    #[test]
    fn result_detail_reveals_answer_keys() {
        let result = ExamResult {
            id: "r1".into(),
            user_id: "u1".into(),
            exam_id: "e1".into(),
            score: 1.0,
            total_marks: 2,
            correct_answers: 1,
            wrong_answers: 0,
            skipped_answers: 1,
            accuracy: 50.0,
            answers: Json(vec![
                RecordedAnswer { question_id: "q1".into(), selected_option: 1 },
                RecordedAnswer { question_id: "q2".into(), selected_option: -1 },
            ]),
            submitted_at: datetime!(2025-01-02 10:00:00),
        };

        let detail = ResultResponse::from_db(result, vec![question("q1", 1), question("q2", 0)]);

        assert_eq!(detail.answers.len(), 2);
        assert_eq!(detail.answers[0].correct_option, 1);
        assert_eq!(detail.answers[1].selected_option, -1);
        assert_eq!(detail.submitted_at, "2025-01-02T10:00:00Z");
    }

    #[test]
    fn answers_for_deleted_questions_are_dropped() {
        let result = ExamResult {
            id: "r1".into(),
            user_id: "u1".into(),
            exam_id: "e1".into(),
            score: 0.0,
            total_marks: 1,
            correct_answers: 0,
            wrong_answers: 0,
            skipped_answers: 1,
            accuracy: 0.0,
            answers: Json(vec![RecordedAnswer { question_id: "ghost".into(), selected_option: 0 }]),
            submitted_at: datetime!(2025-01-02 10:00:00),
        };

        let detail = ResultResponse::from_db(result, vec![question("q1", 1)]);
        assert!(detail.answers.is_empty());
    }
}
