use std::collections::HashMap;

use crate::db::models::RecordedAnswer;

/// Sentinel recorded for questions the learner never answered.
pub(crate) const SKIPPED_OPTION: i32 = -1;

/// The answer key of one question, loaded from storage at submission time.
pub(crate) struct AnswerKey {
    pub(crate) question_id: String,
    pub(crate) correct_option: i32,
    pub(crate) negative_marks: f64,
}

/// Outcome of grading one submission against the authoritative question set.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scorecard {
    pub(crate) score: f64,
    pub(crate) total_marks: i32,
    pub(crate) correct_answers: i32,
    pub(crate) wrong_answers: i32,
    pub(crate) skipped_answers: i32,
    pub(crate) accuracy: f64,
    pub(crate) answers: Vec<RecordedAnswer>,
}

/// Grades a submission. Walks every question of the exam (not just the
/// answered ones), so unanswered questions are counted as skipped. One mark
/// per correct answer; a wrong answer subtracts that question's negative
/// marks. The floor at zero is applied once to the exam total, not per
/// question. An out-of-range option index is scored as wrong.
pub(crate) fn score_submission(
    questions: &[AnswerKey],
    answers: &HashMap<String, i32>,
) -> Scorecard {
    let mut score = 0.0_f64;
    let mut correct_answers = 0;
    let mut wrong_answers = 0;
    let mut skipped_answers = 0;
    let mut recorded = Vec::with_capacity(questions.len());

    for question in questions {
        let selected = answers.get(&question.question_id).copied().unwrap_or(SKIPPED_OPTION);
        recorded.push(RecordedAnswer {
            question_id: question.question_id.clone(),
            selected_option: selected,
        });

        if selected == SKIPPED_OPTION {
            skipped_answers += 1;
        } else if selected == question.correct_option {
            score += 1.0;
            correct_answers += 1;
        } else {
            score -= question.negative_marks;
            wrong_answers += 1;
        }
    }

    let score = score.max(0.0);
    let total = questions.len() as i32;
    let accuracy = if total > 0 {
        round_one_decimal(f64::from(correct_answers) / f64::from(total) * 100.0)
    } else {
        0.0
    };

    Scorecard {
        score,
        total_marks: total,
        correct_answers,
        wrong_answers,
        skipped_answers,
        accuracy,
        answers: recorded,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str, correct: i32, negative: f64) -> AnswerKey {
        AnswerKey { question_id: id.to_string(), correct_option: correct, negative_marks: negative }
    }

    fn answers(pairs: &[(&str, i32)]) -> HashMap<String, i32> {
        pairs.iter().map(|(id, opt)| (id.to_string(), *opt)).collect()
    }

    #[test]
    fn one_correct_one_wrong_with_negative_marking() {
        let questions = [key("q1", 1, 0.0), key("q2", 0, 0.25)];
        let card = score_submission(&questions, &answers(&[("q1", 1), ("q2", 2)]));

        assert_eq!(card.score, 0.75);
        assert_eq!(card.correct_answers, 1);
        assert_eq!(card.wrong_answers, 1);
        assert_eq!(card.skipped_answers, 0);
        assert_eq!(card.total_marks, 2);
        assert_eq!(card.accuracy, 50.0);
    }

    #[test]
    fn empty_submission_skips_every_question() {
        let questions = [key("q1", 1, 0.0), key("q2", 0, 0.25)];
        let card = score_submission(&questions, &HashMap::new());

        assert_eq!(card.score, 0.0);
        assert_eq!(card.correct_answers, 0);
        assert_eq!(card.wrong_answers, 0);
        assert_eq!(card.skipped_answers, 2);
        assert_eq!(card.answers.iter().filter(|a| a.selected_option == SKIPPED_OPTION).count(), 2);
    }

    #[test]
    fn counts_always_cover_the_whole_exam() {
        let questions = [key("q1", 0, 0.5), key("q2", 1, 0.5), key("q3", 2, 0.5)];
        let card = score_submission(&questions, &answers(&[("q1", 0), ("q3", 1)]));

        assert_eq!(card.correct_answers + card.wrong_answers + card.skipped_answers, 3);
        assert_eq!(card.skipped_answers, 1);
    }

    #[test]
    fn score_is_floored_at_zero_for_the_whole_exam() {
        let questions = [key("q1", 0, 1.0), key("q2", 0, 1.0), key("q3", 0, 1.0)];
        let card = score_submission(&questions, &answers(&[("q1", 3), ("q2", 3), ("q3", 0)]));

        // raw sum is 1 - 1 - 1 = -1; the floor applies to the total only
        assert_eq!(card.score, 0.0);
        assert_eq!(card.correct_answers, 1);
        assert_eq!(card.wrong_answers, 2);
    }

    #[test]
    fn floor_is_not_applied_per_question() {
        // A deficit early on must still be recoverable by later answers.
        let questions = [key("q1", 0, 2.0), key("q2", 0, 0.0), key("q3", 0, 0.0)];
        let card = score_submission(&questions, &answers(&[("q1", 1), ("q2", 0), ("q3", 0)]));

        assert_eq!(card.score, 0.0);

        let questions = [key("q1", 0, 1.0), key("q2", 0, 0.0), key("q3", 0, 0.0)];
        let card = score_submission(&questions, &answers(&[("q1", 1), ("q2", 0), ("q3", 0)]));
        assert_eq!(card.score, 1.0);
    }

    #[test]
    fn score_never_exceeds_question_count() {
        let questions = [key("q1", 0, 0.0), key("q2", 1, 0.0)];
        let card = score_submission(&questions, &answers(&[("q1", 0), ("q2", 1), ("ghost", 1)]));

        // answers for unknown questions are ignored entirely
        assert_eq!(card.score, 2.0);
        assert_eq!(card.total_marks, 2);
        assert!(card.score <= f64::from(card.total_marks));
    }

    #[test]
    fn explicit_minus_one_counts_as_skipped() {
        let questions = [key("q1", 0, 0.5)];
        let card = score_submission(&questions, &answers(&[("q1", -1)]));

        assert_eq!(card.skipped_answers, 1);
        assert_eq!(card.wrong_answers, 0);
        assert_eq!(card.score, 0.0);
    }

    #[test]
    fn out_of_range_option_is_scored_as_wrong() {
        let questions = [key("q1", 2, 0.25)];
        let card = score_submission(&questions, &answers(&[("q1", 99)]));

        assert_eq!(card.wrong_answers, 1);
        assert_eq!(card.score, 0.0);
    }

    #[test]
    fn accuracy_rounds_to_one_decimal() {
        let questions = [key("q1", 0, 0.0), key("q2", 0, 0.0), key("q3", 0, 0.0)];
        let card = score_submission(&questions, &answers(&[("q1", 0)]));

        // 1/3 * 100 = 33.333... -> 33.3
        assert_eq!(card.accuracy, 33.3);
    }

    #[test]
    fn empty_exam_grades_to_zero_without_dividing() {
        let card = score_submission(&[], &HashMap::new());

        assert_eq!(card.score, 0.0);
        assert_eq!(card.total_marks, 0);
        assert_eq!(card.accuracy, 0.0);
    }
}
